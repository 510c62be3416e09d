//! Diorama Engine - the desk diorama's group, drag and collision layer in WASM
//!
//! Architecture:
//! - core/        - Vectors, timers, tweens, RNG, errors, logging
//! - domain/      - Group configs, shape library, built-in scene data
//! - systems/     - Physics world, display list, groups, collisions, drag
//! - features/    - The desk's gadgets (conveyor, coffee, fan, bug jar, ...)
//! - simulation/  - Orchestration and the JS facade

pub mod core;
pub mod domain;
pub mod systems;
pub mod features;
pub mod simulation;

// Short paths for the physics collaborator
pub use systems::rigid_body;
pub use systems::rigid_body_system;

use wasm_bindgen::prelude::*;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

// Better error messages in debug mode
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the engine
#[wasm_bindgen]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    core::logging::init(false);
    log::info!("Diorama WASM engine {} initialized", version());
}

/// Get engine version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Re-export main types
pub use simulation::{DioramaCore, DioramaSettings, Machine};
