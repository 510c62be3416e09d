//! Simulation - the desk scene wired together
//!
//! `DioramaCore` owns the physics world, the display list, the group manager,
//! the collision router, the drag manager and every feature. The page drives
//! it through the `Machine` facade: one `update` per animation frame, pointer
//! events in between, and a JSON render extract after each update.
//!
//! Per-concern logic lives in the submodules below; this file only
//! orchestrates.

use crate::core::{BuildError, DioramaError, DioramaResult, Rng, Vec2};
use crate::domain::{GroupConfig, ItemConfig, ShapeLibrary};
use crate::features::{Culling, Effect, Effects, FeatureSet};
use crate::rigid_body_system::PhysicsWorld;
use crate::systems::collisions::{CollisionHandler, CollisionRouter, HandlerId, Removal};
use crate::systems::drag::{Clipboard, DragManager, PointerEvent};
use crate::systems::groups::{Built, EngineContext, GroupInfo, GroupManager};
use crate::systems::scene::Scene;

#[path = "init/init.rs"]
mod init;
#[path = "init/settings.rs"]
mod settings;
#[path = "step/step.rs"]
mod step;
#[path = "commands/commands.rs"]
mod commands;
#[path = "render/render_extract.rs"]
mod render_extract;
mod facade;

pub use facade::Machine;
pub use render_extract::{DebugBody, RenderFrame};
pub use settings::DioramaSettings;
pub use step::MAX_STEP_MS;

/// The running desk scene
pub struct DioramaCore {
    settings: DioramaSettings,
    world: PhysicsWorld,
    scene: Scene,
    groups: GroupManager,
    shapes: ShapeLibrary,
    router: CollisionRouter,
    drag: DragManager,
    features: FeatureSet,
    effects: Effects,
    culling: Culling,
    rng: Rng,

    // State
    clock_ms: f64,
    frame: u64,
    destroyed: bool,
}

impl DioramaCore {
    /// Empty scene with every feature installed; clipboard writes go to the browser
    pub fn new(settings: DioramaSettings) -> DioramaResult<Self> {
        init::create_core(settings, None)
    }

    pub fn with_clipboard(settings: DioramaSettings, clipboard: Box<dyn Clipboard>) -> DioramaResult<Self> {
        init::create_core(settings, Some(clipboard))
    }

    /// Create the built-in desk groups. Returns how many were created.
    pub fn load_default_scene(&mut self) -> DioramaResult<usize> {
        init::load_default_scene(self)
    }

    /// Parse and create one group; returns its id
    pub fn load_group_json(&mut self, json: &str) -> DioramaResult<String> {
        let config = GroupConfig::from_json(json)?;
        Ok(init::load_group(self, config))
    }

    pub fn load_group(&mut self, config: GroupConfig) -> String {
        init::load_group(self, config)
    }

    /// Advance one frame by `dt_ms`
    pub fn update(&mut self, dt_ms: f64) {
        step::update(self, dt_ms);
    }

    pub fn pointer_down(&mut self, event: PointerEvent) {
        commands::pointer_down(self, event);
    }

    pub fn pointer_move(&mut self, event: PointerEvent) {
        commands::pointer_move(self, event);
    }

    /// Ends any drag; returns the edited group JSON after a static drag
    pub fn pointer_up(&mut self) -> Option<String> {
        commands::pointer_up(self)
    }

    /// Route pairs of the live scene to `handler` from the next update on
    pub fn add_collision_handler(&mut self, handler: CollisionHandler) -> HandlerId {
        self.router.add_collision_handler(handler)
    }

    /// Deferred while one of the handler's pairs is touching; it gets no
    /// events in between and is dropped at the end of the next update
    pub fn remove_collision_handler(&mut self, id: HandlerId) -> Removal {
        self.router.remove_collision_handler(id, &self.world)
    }

    /// Register an item type for groups loaded afterwards; first registration wins
    pub fn add_object_builder<F>(&mut self, name: impl Into<String>, builder: F) -> bool
    where
        F: Fn(&mut EngineContext<'_>, &GroupInfo, &ItemConfig) -> Result<Built, BuildError> + 'static,
    {
        self.groups.add_object_builder(name, builder)
    }

    /// Extra fan air sources (e.g. smoke particles owned by the page)
    pub fn set_air_sources(&mut self, sources: Vec<Vec2>) {
        self.features.fan.set_air_sources(sources);
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        self.effects.drain()
    }

    /// Draw list plus pending effects; drains the effects
    pub fn render_frame(&mut self) -> RenderFrame<'_> {
        render_extract::extract_frame(self)
    }

    pub fn render_json(&mut self) -> DioramaResult<String> {
        render_extract::extract_frame_json(self)
    }

    /// Current config of a group, pretty-printed
    pub fn group_config_json(&self, id: &str) -> DioramaResult<String> {
        self.groups
            .serialize_group_config(id)
            .ok_or_else(|| DioramaError::UnknownGroup(id.to_string()))?
            .to_json_pretty()
    }

    pub fn set_gravity(&mut self, x: f32, y: f32) {
        settings::set_gravity(self, x, y);
    }

    pub fn set_debug(&mut self, debug: bool) {
        settings::set_debug(self, debug);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        settings::resize(self, width, height);
    }

    /// Tear the scene down. Safe to call more than once; later updates are no-ops.
    pub fn destroy(&mut self) {
        init::destroy(self);
    }

    pub fn settings(&self) -> &DioramaSettings {
        &self.settings
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    pub fn router(&self) -> &CollisionRouter {
        &self.router
    }

    pub fn drag(&self) -> &DragManager {
        &self.drag
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn time_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
