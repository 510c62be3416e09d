//! Features - the desk's gadgets
//!
//! Each feature registers its item builders and collision handlers once, then
//! gets called around every physics step:
//! - `pre_update` runs before the step (kinematic moves, spawns, AI)
//! - `update` runs after collisions were dispatched (state machines, visuals)
//!
//! One update is one frame; per-frame constants are applied once per call.

mod balls;
mod books;
mod bugjar;
mod coffee;
mod computer;
mod conveyor;
mod culling;
mod decor;
mod effects;
mod fan;
mod paddle;
mod robot_arm;

pub use balls::BallSpawner;
pub use books::Books;
pub use bugjar::BugjarFeature;
pub use coffee::Coffee;
pub use computer::Computer;
pub use conveyor::Conveyor;
pub use culling::Culling;
pub use decor::Decor;
pub use effects::{Effect, Effects};
pub use fan::Fan;
pub use paddle::Paddles;
pub use robot_arm::{RobotArm, RobotArms};

use crate::core::Rng;
use crate::domain::ShapeLibrary;
use crate::rigid_body_system::PhysicsWorld;
use crate::systems::collisions::CollisionRouter;
use crate::systems::groups::GroupManager;
use crate::systems::scene::Scene;

/// Everything a feature may touch during an update
pub struct FeatureContext<'a> {
    pub world: &'a mut PhysicsWorld,
    pub scene: &'a mut Scene,
    pub groups: &'a mut GroupManager,
    pub shapes: &'a ShapeLibrary,
    pub effects: &'a Effects,
    pub rng: &'a mut Rng,
    /// Scene clock
    pub now_ms: f64,
    pub dt_ms: f64,
}

pub trait Feature {
    fn name(&self) -> &'static str;

    /// Register item builders; called before any group is created
    fn register_builders(&self, _groups: &mut GroupManager) {}

    fn install_handlers(&self, _router: &mut CollisionRouter, _effects: &Effects) {}

    fn pre_update(&mut self, _ctx: &mut FeatureContext<'_>) {}

    fn update(&mut self, _ctx: &mut FeatureContext<'_>) {}
}

/// Every feature of the desk, dispatched in a fixed order
pub struct FeatureSet {
    pub paddles: Paddles,
    pub conveyor: Conveyor,
    pub decor: Decor,
    pub books: Books,
    pub coffee: Coffee,
    pub fan: Fan,
    pub computer: Computer,
    pub bugjar: BugjarFeature,
    pub robot_arms: RobotArms,
    pub balls: BallSpawner,
}

impl FeatureSet {
    pub fn new(ball_spawn_interval_ms: f64, max_balls: Option<usize>) -> Self {
        Self {
            paddles: Paddles,
            conveyor: Conveyor::new(),
            decor: Decor,
            books: Books,
            coffee: Coffee::new(),
            fan: Fan::new(),
            computer: Computer::new(),
            bugjar: BugjarFeature::new(),
            robot_arms: RobotArms::new(),
            balls: BallSpawner::new(ball_spawn_interval_ms, max_balls),
        }
    }

    fn all(&self) -> [&dyn Feature; 10] {
        [
            &self.paddles,
            &self.conveyor,
            &self.decor,
            &self.books,
            &self.coffee,
            &self.fan,
            &self.computer,
            &self.bugjar,
            &self.robot_arms,
            &self.balls,
        ]
    }

    fn all_mut(&mut self) -> [&mut dyn Feature; 10] {
        [
            &mut self.paddles,
            &mut self.conveyor,
            &mut self.decor,
            &mut self.books,
            &mut self.coffee,
            &mut self.fan,
            &mut self.computer,
            &mut self.bugjar,
            &mut self.robot_arms,
            &mut self.balls,
        ]
    }

    /// Register builders and handlers of every feature
    pub fn install(&self, groups: &mut GroupManager, router: &mut CollisionRouter, effects: &Effects) {
        for feature in self.all() {
            feature.register_builders(groups);
            feature.install_handlers(router, effects);
            log::debug!("feature `{}` installed", feature.name());
        }
    }

    pub fn pre_update(&mut self, ctx: &mut FeatureContext<'_>) {
        for feature in self.all_mut() {
            feature.pre_update(ctx);
        }
    }

    pub fn update(&mut self, ctx: &mut FeatureContext<'_>) {
        for feature in self.all_mut() {
            feature.update(ctx);
        }
    }
}
