//! RigidBody - A solid body that moves as a unit
//!
//! The body stores its shape in local coordinates (relative to center 0,0)
//! and transforms them to world coordinates using position and rotation.

mod body;
mod shape;

pub use body::{Body, BodyId, BodyOptions, Bounds};
pub use shape::Shape;
