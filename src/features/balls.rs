//! Ball chute: drops a fresh ball on a fixed interval

use crate::core::{Timer, Vec2};
use crate::rigid_body::{BodyId, BodyOptions, Shape};
use crate::rigid_body_system::PhysicsWorld;
use crate::systems::scene::{Attachment, Scene, VisualId, VisualKind};

use super::{Feature, FeatureContext};

pub const BALL_LABEL: &str = "ball";
const BALL_RADIUS: f32 = 10.0;
const BALL_SPAWN: Vec2 = Vec2::new(100.0, 50.0);
const BALL_DEPTH: i32 = 110;

pub struct BallSpawner {
    timer: Timer,
    max_balls: Option<usize>,
    balls: Vec<(BodyId, VisualId)>,
}

impl BallSpawner {
    pub fn new(interval_ms: f64, max_balls: Option<usize>) -> Self {
        Self {
            timer: Timer::looping(interval_ms),
            max_balls,
            balls: Vec::new(),
        }
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    pub fn balls(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.balls.iter().map(|(body, _)| *body)
    }

    /// Drop one ball at the top of the chute
    pub fn spawn_ball(&mut self, world: &mut PhysicsWorld, scene: &mut Scene) -> BodyId {
        let body = world.create_dynamic_body(
            BALL_SPAWN,
            Shape::circle(BALL_RADIUS),
            BodyOptions {
                restitution: 0.9,
                friction: 0.002,
                user_draggable: true,
                ..BodyOptions::labelled(BALL_LABEL)
            },
        );
        let visual = scene.add(
            VisualKind::Sprite {
                texture: BALL_LABEL.to_string(),
            },
            BALL_SPAWN,
            BALL_DEPTH,
        );
        scene.attach(visual, Attachment::new(body, true));
        self.balls.push((body, visual));
        body
    }

    fn is_full(&self) -> bool {
        self.max_balls.map_or(false, |max| self.balls.len() >= max)
    }
}

impl Feature for BallSpawner {
    fn name(&self) -> &'static str {
        "balls"
    }

    fn pre_update(&mut self, ctx: &mut FeatureContext<'_>) {
        let scene = &mut *ctx.scene;
        let world = &*ctx.world;
        self.balls.retain(|&(body, visual)| {
            let alive = world.contains(body);
            if !alive {
                scene.destroy(visual);
            }
            alive
        });

        for _ in 0..self.timer.tick(ctx.dt_ms) {
            if self.is_full() {
                log::debug!("ball limit reached, skipping spawn");
                break;
            }
            self.spawn_ball(ctx.world, ctx.scene);
        }
    }
}
