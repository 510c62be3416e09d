//! Robot arm: a static base with boom, head and two pincers driven by
//! two-link inverse kinematics
//!
//! The bodies are static and positioned directly; motion comes from tweened
//! joint angles applied before every physics step.

use std::cell::RefCell;
use std::f32::consts::{FRAC_PI_2, PI};
use std::rc::Rc;

use crate::core::tween::{shortest_between, wrap_angle};
use crate::core::{BuildError, Rng, Timer, Tween, Vec2};
use crate::domain::{ItemConfig, RobotArmConfig};
use crate::rigid_body::{BodyId, BodyOptions, Shape};
use crate::rigid_body_system::PhysicsWorld;
use crate::systems::groups::{Built, EngineContext, GroupInfo, GroupManager, DEFAULT_DEPTH};
use crate::systems::scene::{Attachment, VisualKind};

use super::{Feature, FeatureContext};

pub const BASE_LABEL: &str = "robot-base";
const BASE_SIZE: f32 = 30.0;
const BOOM_THICKNESS: f32 = 20.0;
const HEAD_THICKNESS: f32 = 18.0;
const BASE_SPRITE_OFFSET: Vec2 = Vec2::new(0.0, -23.5);

/// Resting pose relative to the base
const PARK_OFFSET: Vec2 = Vec2::new(-110.0, 182.0);
const CYCLE_MS: f64 = 4000.0;
const ARM_MOVE_MS: f32 = 1000.0;
const PINCER_MOVE_MS: f32 = 300.0;
const PINCERS_OPEN: f32 = 80.0;
const PINCERS_CLOSED: f32 = 30.0;
/// Reachable target box relative to the base, inclusive
const TARGET_X: (i32, i32) = (-210, 100);
const TARGET_Y: (i32, i32) = (80, 210);

/// Joint angles for a two-link chain rooted at the origin so that its tip
/// lands on `delta`. Returns `(first, relative)` where `relative` is the
/// second link's angle against the first. Out-of-reach targets fully extend
/// toward the target.
pub fn solve_ik(first_len: f32, second_len: f32, delta: Vec2) -> (f32, f32) {
    let heading = delta.y.atan2(delta.x);
    let max_reach = first_len + second_len;
    let min_reach = (first_len - second_len).abs();
    let d = delta.length();
    if d >= max_reach - 1e-4 {
        return (heading, 0.0);
    }
    let reach = d.clamp(min_reach.max(1e-4), max_reach);

    let cos_interior = ((first_len * first_len + second_len * second_len - reach * reach) / (2.0 * first_len * second_len)).clamp(-1.0, 1.0);
    let cos_shoulder = ((reach * reach + first_len * first_len - second_len * second_len) / (2.0 * reach * first_len)).clamp(-1.0, 1.0);
    let interior = cos_interior.acos();
    let shoulder = cos_shoulder.acos();

    // elbow raised: the boom swings past the target heading, the head folds back
    (wrap_angle(heading + shoulder), wrap_angle(-(PI - interior)))
}

#[derive(Clone, Debug)]
struct ArmMotion {
    progress: Tween,
    start_boom: f32,
    delta_boom: f32,
    start_head: f32,
    delta_head: f32,
}

/// Handle to one arm's bodies plus its running tweens
#[derive(Clone, Debug)]
pub struct RobotArm {
    config: RobotArmConfig,
    base: BodyId,
    boom: BodyId,
    head: BodyId,
    pincer_left: BodyId,
    pincer_right: BodyId,
    motion: Option<ArmMotion>,
    pincer_motion: Option<Tween>,
}

impl RobotArm {
    pub fn base(&self) -> BodyId {
        self.base
    }

    pub fn bodies(&self) -> [BodyId; 5] {
        [self.base, self.boom, self.head, self.pincer_left, self.pincer_right]
    }

    pub fn is_moving(&self) -> bool {
        self.motion.is_some() || self.pincer_motion.is_some()
    }

    /// Distance from the boom pivot to the head joint
    fn upper_len(&self) -> f32 {
        self.config.boom_length - self.config.head_joint_offset
    }

    /// Distance from the head joint to the head end
    fn lower_len(&self) -> f32 {
        self.config.head_length - self.config.head_joint_local_offset
    }

    pub fn max_reach(&self) -> f32 {
        self.upper_len() + self.lower_len()
    }

    pub fn base_position(&self, world: &PhysicsWorld) -> Vec2 {
        world.body(self.base).map_or(Vec2::zero(), |b| b.position)
    }

    /// (boom angle, head angle relative to the boom)
    pub fn joint_angles(&self, world: &PhysicsWorld) -> (f32, f32) {
        let boom = world.body(self.boom).map_or(0.0, |b| b.angle);
        let head = world.body(self.head).map_or(0.0, |b| b.angle);
        (wrap_angle(boom), wrap_angle(head - boom))
    }

    /// Far end of the head, where the pincers hang
    pub fn head_end(&self, world: &PhysicsWorld) -> Vec2 {
        world.body(self.head).map_or(Vec2::zero(), |head| {
            head.position + Vec2::from_angle(head.angle) * (self.config.head_length / 2.0)
        })
    }

    pub fn pincers_distance(&self, world: &PhysicsWorld) -> f32 {
        match (world.body(self.pincer_left), world.body(self.pincer_right)) {
            (Some(left), Some(right)) => left.position.distance(right.position),
            _ => 0.0,
        }
    }

    /// Swing the arm so the pincer tips reach `target` over `duration_ms`.
    /// Replaces any running move; unreachable targets are clamped to the
    /// closest reachable point.
    pub fn go_to(&mut self, world: &mut PhysicsWorld, target: Vec2, duration_ms: f32) {
        let base = self.base_position(world);
        let towards = target - base;
        let mut aim = target;
        if towards.length() > 1e-3 {
            aim = target - towards.normalize() * (self.config.pincer_length / 2.0);
        }

        let rel = aim - base;
        let max_reach = self.max_reach();
        if rel.length() > max_reach {
            aim = base + rel.normalize() * max_reach;
            log::warn!(
                "robot arm target unreachable, clamping to closest point ({:.2}, {:.2})",
                aim.x,
                aim.y
            );
        }

        let (boom, head) = solve_ik(self.upper_len(), self.lower_len(), aim - base);
        if duration_ms <= 0.0 {
            self.motion = None;
            self.set_arm_angles(world, boom, head);
            return;
        }
        let (start_boom, start_head) = self.joint_angles(world);
        self.motion = Some(ArmMotion {
            progress: Tween::new(0.0, 1.0, duration_ms),
            start_boom,
            delta_boom: shortest_between(start_boom, boom),
            start_head,
            delta_head: shortest_between(start_head, head),
        });
    }

    /// Open or close the pincers to `distance`, clamped to the configured range
    pub fn set_pincers_distance(&mut self, world: &mut PhysicsWorld, distance: f32, duration_ms: f32) {
        let distance = distance.clamp(self.config.pincer_min_dist, self.config.pincer_max_dist);
        if duration_ms <= 0.0 {
            self.pincer_motion = None;
            self.place_pincers(world, distance);
            return;
        }
        self.pincer_motion = Some(Tween::new(self.pincers_distance(world), distance, duration_ms));
    }

    /// Step running tweens by `dt_ms`
    pub fn advance(&mut self, world: &mut PhysicsWorld, dt_ms: f32) {
        if let Some(motion) = self.motion.as_mut() {
            let v = motion.progress.advance(dt_ms);
            let boom = wrap_angle(motion.start_boom + motion.delta_boom * v);
            let head = wrap_angle(motion.start_head + motion.delta_head * v);
            let done = motion.progress.is_complete();
            self.set_arm_angles(world, boom, head);
            if done {
                self.motion = None;
            }
        }
        if let Some(tween) = self.pincer_motion.as_mut() {
            let distance = tween.advance(dt_ms);
            let done = tween.is_complete();
            self.place_pincers(world, distance);
            if done {
                self.pincer_motion = None;
            }
        }
    }

    fn set_arm_angles(&self, world: &mut PhysicsWorld, boom_angle: f32, head_rel: f32) {
        let base = self.base_position(world);
        let head_angle = wrap_angle(boom_angle + head_rel);
        let boom_dir = Vec2::from_angle(boom_angle);
        let joint = base + boom_dir * self.upper_len();
        let head_center = joint + Vec2::from_angle(head_angle) * (self.config.head_length / 2.0 - self.config.head_joint_local_offset);

        world.set_position(self.boom, base + boom_dir * (self.config.boom_length / 2.0));
        world.set_angle(self.boom, boom_angle);
        world.set_position(self.head, head_center);
        world.set_angle(self.head, head_angle);

        let distance = self.pincers_distance(world);
        self.place_pincers(world, distance);
    }

    fn place_pincers(&self, world: &mut PhysicsWorld, distance: f32) {
        let angle = world.body(self.head).map_or(0.0, |b| wrap_angle(b.angle));
        let dir = Vec2::from_angle(angle);
        let root = self.head_end(world) + dir * self.config.pincer_distance_from_head;
        let side = Vec2::from_angle(angle + FRAC_PI_2) * (distance / 2.0);

        world.set_position(self.pincer_left, root + side);
        world.set_angle(self.pincer_left, angle);
        world.set_position(self.pincer_right, root - side);
        world.set_angle(self.pincer_right, angle);
    }
}

/// Both IK links must keep a positive length once the joint offsets are taken off
fn check_links(config: &RobotArmConfig) -> Result<(), BuildError> {
    let links = [
        ("upper", config.boom_length - config.head_joint_offset),
        ("lower", config.head_length - config.head_joint_local_offset),
    ];
    match links.into_iter().find(|(_, length)| length.is_nan() || *length <= 0.0) {
        Some((link, length)) => Err(BuildError::DegenerateLink { link, length }),
        None => Ok(()),
    }
}

pub(crate) fn build_robot_arm(ctx: &mut EngineContext<'_>, item: &ItemConfig) -> Result<(Built, RobotArm), BuildError> {
    let config: RobotArmConfig = item.typed()?;
    check_links(&config)?;
    let origin = item.position();
    let depth = item.depth.unwrap_or(DEFAULT_DEPTH);

    let base = ctx
        .world
        .create_static_body(origin, Shape::rect(BASE_SIZE, BASE_SIZE), BodyOptions::labelled(BASE_LABEL));
    let part = |label: &str| BodyOptions {
        parent: Some(base),
        ..BodyOptions::labelled(label)
    };

    let boom = ctx.world.create_static_body(
        origin + Vec2::new(config.boom_length / 2.0, 0.0),
        Shape::rect(config.boom_length, BOOM_THICKNESS),
        part("robot-boom"),
    );
    let joint_x = config.boom_length - config.head_joint_offset;
    let head_x = joint_x + config.head_length / 2.0 - config.head_joint_local_offset;
    let head = ctx.world.create_static_body(
        origin + Vec2::new(head_x, 0.0),
        Shape::rect(config.head_length, HEAD_THICKNESS),
        part("robot-head"),
    );
    let pincer_x = head_x + config.head_length / 2.0 + config.pincer_distance_from_head;
    let pincer_shape = Shape::rect(config.pincer_length, config.pincer_width);
    let pincer_left = ctx.world.create_static_body(
        origin + Vec2::new(pincer_x, -config.pincer_min_dist / 2.0),
        pincer_shape.clone(),
        part("robot-pincer-left"),
    );
    let pincer_right = ctx.world.create_static_body(
        origin + Vec2::new(pincer_x, config.pincer_min_dist / 2.0),
        pincer_shape,
        part("robot-pincer-right"),
    );

    let mut sprite = |texture: &str, attachment: Attachment| {
        let id = ctx.scene.add(
            VisualKind::Sprite {
                texture: texture.to_string(),
            },
            origin,
            depth,
        );
        ctx.scene.attach(id, attachment);
        id
    };
    let base_visual = sprite("robotBase", Attachment::new(base, true).with_offset(BASE_SPRITE_OFFSET));
    let extras = vec![
        sprite("robotArm", Attachment::new(boom, true).with_rotation_offset(FRAC_PI_2)),
        sprite("robotHead", Attachment::new(head, true).with_rotation_offset(-FRAC_PI_2)),
        sprite("pincer2", Attachment::new(pincer_left, true).with_rotation_offset(FRAC_PI_2)),
        sprite("pincer1", Attachment::new(pincer_right, true).with_rotation_offset(FRAC_PI_2)),
    ];

    let mut built = Built::with_body(base, base_visual).with_parts(vec![boom, head, pincer_left, pincer_right]);
    for visual in extras {
        built = built.with_extra_visual(visual);
    }

    let arm = RobotArm {
        config,
        base,
        boom,
        head,
        pincer_left,
        pincer_right,
        motion: None,
        pincer_motion: None,
    };
    Ok((built, arm))
}

#[derive(Clone, Debug, Default)]
enum Stage {
    #[default]
    Idle,
    Reaching,
    Carrying,
    Releasing,
}

/// Pick-and-place loop: open, reach, move, close, move away
#[derive(Clone, Debug)]
struct Routine {
    parked: bool,
    clock: Timer,
    elapsed_ms: f64,
    stage: Stage,
    stops: [Vec2; 3],
}

impl Routine {
    fn new() -> Self {
        Self {
            parked: false,
            clock: Timer::looping(CYCLE_MS),
            elapsed_ms: 0.0,
            stage: Stage::Idle,
            stops: [Vec2::zero(); 3],
        }
    }

    fn random_stop(rng: &mut Rng) -> Vec2 {
        let pick = |rng: &mut Rng, (min, max): (i32, i32)| min as f32 + rng.between(0, (max - min) as u32) as f32;
        let x = pick(rng, TARGET_X);
        Vec2::new(x, pick(rng, TARGET_Y))
    }

    fn drive(&mut self, arm: &mut RobotArm, world: &mut PhysicsWorld, rng: &mut Rng, dt_ms: f64) {
        let base = arm.base_position(world);
        if !self.parked {
            arm.go_to(world, base + PARK_OFFSET, 0.0);
            self.parked = true;
        }

        self.elapsed_ms += dt_ms;
        let next = match self.stage {
            Stage::Reaching if self.elapsed_ms >= 2.0 * ARM_MOVE_MS as f64 => {
                arm.go_to(world, base + self.stops[1], ARM_MOVE_MS);
                Stage::Carrying
            }
            Stage::Carrying if self.elapsed_ms >= 2.6 * ARM_MOVE_MS as f64 => {
                arm.set_pincers_distance(world, PINCERS_CLOSED, PINCER_MOVE_MS / 2.0);
                Stage::Releasing
            }
            Stage::Releasing if self.elapsed_ms >= 3.5 * ARM_MOVE_MS as f64 => {
                arm.go_to(world, base + self.stops[2], ARM_MOVE_MS);
                Stage::Idle
            }
            ref stage => stage.clone(),
        };
        self.stage = next;

        if self.clock.tick(dt_ms) > 0 {
            self.stops = [Self::random_stop(rng), Self::random_stop(rng), Self::random_stop(rng)];
            arm.set_pincers_distance(world, PINCERS_OPEN, PINCER_MOVE_MS);
            arm.go_to(world, base + self.stops[0], ARM_MOVE_MS);
            self.elapsed_ms = 0.0;
            self.stage = Stage::Reaching;
        }
    }
}

#[derive(Debug, Default)]
struct Rig {
    arms: Vec<(RobotArm, Routine)>,
}

impl Default for Routine {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RobotArms {
    rig: Rc<RefCell<Rig>>,
}

impl RobotArms {
    pub fn new() -> Self {
        Self { rig: Rc::default() }
    }

    pub fn len(&self) -> usize {
        self.rig.borrow().arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the arm at `index`
    pub fn arm(&self, index: usize) -> Option<RobotArm> {
        self.rig.borrow().arms.get(index).map(|(arm, _)| arm.clone())
    }

    /// Run `f` against the live arm at `index`
    pub fn with_arm<R>(&self, index: usize, f: impl FnOnce(&mut RobotArm) -> R) -> Option<R> {
        self.rig.borrow_mut().arms.get_mut(index).map(|(arm, _)| f(arm))
    }
}

impl Default for RobotArms {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for RobotArms {
    fn name(&self) -> &'static str {
        "robot_arms"
    }

    fn register_builders(&self, groups: &mut GroupManager) {
        let rig = Rc::clone(&self.rig);
        groups.add_object_builder("robotArm", move |ctx: &mut EngineContext<'_>, _group: &GroupInfo, item: &ItemConfig| {
            let (built, arm) = build_robot_arm(ctx, item)?;
            rig.borrow_mut().arms.push((arm, Routine::new()));
            Ok(built)
        });
    }

    fn pre_update(&mut self, ctx: &mut FeatureContext<'_>) {
        let mut rig = self.rig.borrow_mut();
        rig.arms.retain(|(arm, _)| ctx.world.contains(arm.base));
        for (arm, _) in &mut rig.arms {
            arm.advance(ctx.world, ctx.dt_ms as f32);
        }
    }

    fn update(&mut self, ctx: &mut FeatureContext<'_>) {
        let mut rig = self.rig.borrow_mut();
        for (arm, routine) in &mut rig.arms {
            routine.drive(arm, ctx.world, ctx.rng, ctx.dt_ms);
        }
    }
}
