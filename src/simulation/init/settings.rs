use serde::{Deserialize, Serialize};

use crate::core::{ConfigError, DioramaResult, Vec2};

use super::DioramaCore;

/// Scene options passed in from the page
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DioramaSettings {
    pub width: f32,
    pub height: f32,
    /// Debug logging and body outlines in the render extract
    pub debug: bool,
    /// px/s²
    pub gravity: Vec2,
    pub removal_distance: f32,
    pub center_no_swing_ratio: f32,
    pub grab_stiffness: f32,
    pub ball_spawn_interval_ms: f64,
    pub max_balls: Option<usize>,
    pub seed: u32,
}

impl Default for DioramaSettings {
    fn default() -> Self {
        Self {
            width: 1100.0,
            height: 1100.0,
            debug: false,
            gravity: Vec2::new(0.0, 980.0),
            removal_distance: 200.0,
            center_no_swing_ratio: 0.4,
            grab_stiffness: 0.2,
            ball_spawn_interval_ms: 2500.0,
            max_balls: None,
            seed: 12345,
        }
    }
}

impl DioramaSettings {
    /// Parse the options object; an empty document gives the defaults
    pub fn from_json(json: &str) -> DioramaResult<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidSetting(msg));
        if !(self.width > 0.0 && self.height > 0.0) {
            return invalid(format!("frame must be positive, got {}x{}", self.width, self.height));
        }
        if !(0.0..=1.0).contains(&self.center_no_swing_ratio) {
            return invalid(format!("centerNoSwingRatio must be in [0, 1], got {}", self.center_no_swing_ratio));
        }
        if !(self.grab_stiffness > 0.0 && self.grab_stiffness <= 1.0) {
            return invalid(format!("grabStiffness must be in (0, 1], got {}", self.grab_stiffness));
        }
        if !(self.ball_spawn_interval_ms > 0.0) {
            return invalid(format!("ballSpawnIntervalMs must be positive, got {}", self.ball_spawn_interval_ms));
        }
        if self.removal_distance < 0.0 {
            return invalid(format!("removalDistance must not be negative, got {}", self.removal_distance));
        }
        Ok(())
    }
}

pub(super) fn set_gravity(core: &mut DioramaCore, x: f32, y: f32) {
    core.settings.gravity = Vec2::new(x, y);
    core.world.set_gravity(core.settings.gravity);
}

pub(super) fn set_debug(core: &mut DioramaCore, debug: bool) {
    core.settings.debug = debug;
    log::set_max_level(if debug { log::LevelFilter::Debug } else { log::LevelFilter::Info });
}

pub(super) fn resize(core: &mut DioramaCore, width: f32, height: f32) {
    if width <= 0.0 || height <= 0.0 {
        log::warn!("ignoring resize to {width}x{height}");
        return;
    }
    core.settings.width = width;
    core.settings.height = height;
    core.culling.width = width;
    core.culling.height = height;
}
