//! Groups - declarative configs turned into draggable clusters of entities

mod builders;
mod manager;

pub use builders::{BuilderRegistry, Built, EngineContext, GroupInfo, ObjectBuilder, DEFAULT_DEPTH};
pub use manager::{Group, GroupManager, MachineObject, HANDLE_LABEL, HANDLE_RADIUS};
