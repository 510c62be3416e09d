//! Engine-side systems: physics, display list, groups, collision routing and drag

pub mod collisions;
pub mod drag;
pub mod groups;
pub mod rigid_body;
pub mod rigid_body_system;
pub mod scene;
