//! PhysicsWorld - minimal rigid body world for the diorama
//!
//! Deliberately small (no islands, no sleeping, single iteration):
//! - Gravity + air friction integration for dynamic bodies.
//! - Circle / oriented-box contact detection with impulse response.
//! - Spring constraints between a world point and a body offset.
//! - Pair bookkeeping that turns overlaps into start/active/end events.

mod collision;
mod constraint;
mod system;

pub use constraint::{Constraint, ConstraintId, ConstraintSpec};
pub use system::{Pair, PhysicsWorld, StepEvents};
