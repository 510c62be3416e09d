//! Collisions - routes the world's pair stream to validated handlers
//!
//! Handler removal requested while one of its pairs is still touching is
//! deferred to `after_update`, so a handler is never dropped in the middle of
//! a step's dispatch. A handler awaiting removal receives no further events.

mod router;
mod validator;

pub use router::{CollisionCallback, CollisionContext, CollisionHandler, CollisionPhase, CollisionRouter, HandlerId, Removal};
pub use validator::Validator;
