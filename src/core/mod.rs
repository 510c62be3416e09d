//! Core primitives shared by every system

pub mod error;
pub mod logging;
pub mod random;
pub mod timer;
pub mod tween;
pub mod vec2;

pub use error::{BuildError, ClipboardError, ConfigError, DioramaError, DioramaResult};
pub use random::Rng;
pub use timer::Timer;
pub use tween::Tween;
pub use vec2::Vec2;
