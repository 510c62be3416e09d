//! Scene - display list rendered by the page
//!
//! The crate decides what is on screen and where; pixels, textures and
//! particles stay on the JS side, which draws from the render extract.

mod scene;
mod visual;

pub use scene::Scene;
pub use visual::{Attachment, Visual, VisualId, VisualKind};
