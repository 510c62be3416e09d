//! Group configs of the default desk scene, embedded at compile time

use crate::core::DioramaResult;

use super::config::GroupConfig;

/// (name, json) in creation order
pub const DEFAULT_GROUPS: [(&str, &str); 7] = [
    ("ball", include_str!("../../assets/groups/ball.json")),
    ("coffee", include_str!("../../assets/groups/coffee.json")),
    ("fan", include_str!("../../assets/groups/fan.json")),
    ("books", include_str!("../../assets/groups/books.json")),
    ("bugjar", include_str!("../../assets/groups/bugjar.json")),
    ("robot", include_str!("../../assets/groups/robot.json")),
    ("computer", include_str!("../../assets/groups/computer.json")),
];

/// Parse every default group, failing on the first malformed one
pub fn default_groups() -> DioramaResult<Vec<GroupConfig>> {
    DEFAULT_GROUPS
        .iter()
        .map(|(_, json)| GroupConfig::from_json(json))
        .collect()
}
