//! Domain data: declarative group configs and the shape library

pub mod config;
pub mod scene_data;
pub mod shapes;

pub use config::{
    BookConfig, BugjarConfig, ConveyorConfig, DashedLineConfig, DashedLineStyle, GroupConfig, ItemConfig,
    LabelConfig, LabelStyle, PaddleConfig, RobotArmConfig, SpriteBodyConfig, SpriteConfig, StaticConfig,
    TypedItem,
};
pub use shapes::ShapeLibrary;
