//! Computer: bumping the keyboard glitches the screen a bit more each time,
//! up to a cap. Smoke puffs rise from the case toward the fan, and a coiled
//! cord ties the keyboard to the computer.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::Vec2;
use crate::rigid_body::{BodyId, BodyOptions, Shape};
use crate::rigid_body_system::{ConstraintId, ConstraintSpec};
use crate::systems::collisions::{CollisionHandler, CollisionRouter};
use crate::systems::scene::{Attachment, VisualId, VisualKind};

use super::fan::SMOKE_LABEL;
use super::{Effects, Feature, FeatureContext};

pub const COMPUTER_ID: &str = "computer";
pub const KEYBOARD_ID: &str = "keyboard";
pub const KEYBOARD_LABEL: &str = "keyboard";

/// Keyboard hits before this (after the computer appears) are the desk settling
pub const ARM_DELAY_MS: f64 = 2000.0;
/// Quiet time after the last hit of a burst before the burst counts
pub const DEBOUNCE_MS: f64 = 500.0;
pub const FAULT_STEP: f32 = 0.1;
pub const MAX_FAULT: f32 = 0.7;

/// 118x116 monitor face drawn at 0.6 scale
const SCREEN_SIZE: Vec2 = Vec2::new(70.8, 69.6);
/// Screen centre relative to the computer body
const SCREEN_OFFSET: Vec2 = Vec2::new(-15.6, -20.2);
const SCREEN_DEPTH: i32 = 100;
const BG_NORMAL: u32 = 0x23264a;
const BG_FAULT: u32 = 0xff3a3a;
const LINE_NORMAL: u32 = 0x7ed6de;
const LINE_FAULT: u32 = 0xcfcfcf;
const X_NORMAL: u32 = 0xff5c5c;
const X_FAULT: u32 = 0x000000;

const COMPUTER_HALF_HEIGHT: f32 = 75.5;
const SMOKE_EVERY_FRAMES: u32 = 60;
/// Puff offsets from the top of the case
const SMOKE_PUFFS: [Vec2; 3] = [Vec2::new(0.0, 0.0), Vec2::new(5.0, -2.0), Vec2::new(-5.0, -1.0)];
const SMOKE_RADIUS: f32 = 4.0;
const SMOKE_SPEED: (f32, f32) = (20.0, 40.0);
/// Launch angle range, screen degrees (270 is straight up)
const SMOKE_ANGLE_DEG: (f32, f32) = (260.0, 280.0);
/// Upward acceleration, px/s²
const SMOKE_LIFT: f32 = 50.0;
/// Horizontal sway amplitude, px/s
const SMOKE_SWAY: f32 = 5.0;
const SMOKE_LIFESPAN_MS: (u32, u32) = (2000, 3000);
const SMOKE_DEPTH: i32 = 90;

const CORD_COMPUTER_OFFSET: Vec2 = Vec2::new(-70.0, 55.0);
const CORD_KEYBOARD_OFFSET: Vec2 = Vec2::new(35.0, 5.0);
const CORD_REST_LENGTH: f32 = 80.0;
const CORD_STIFFNESS: f32 = 0.004;
const CORD_COILS: u32 = 5;
const CORD_COIL_RADIUS: f32 = 10.0;
const CORD_COLOR: u32 = 0x2c3557;
const CORD_LINE_WIDTH: f32 = 4.0;
const CORD_DEPTH: i32 = 95;

/// Trailing debounce: a burst of hits counts once, `DEBOUNCE_MS` after its
/// last hit
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Debounce {
    due_ms: Option<f64>,
}

impl Debounce {
    pub fn hit(&mut self, now_ms: f64) {
        self.due_ms = Some(now_ms + DEBOUNCE_MS);
    }

    /// True once per burst, as soon as its quiet time has passed
    pub fn fire(&mut self, now_ms: f64) -> bool {
        match self.due_ms {
            Some(due) if now_ms >= due => {
                self.due_ms = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.due_ms.is_some()
    }
}

pub fn raise_fault(level: f32) -> f32 {
    (level + FAULT_STEP).clamp(0.0, MAX_FAULT)
}

/// Per-channel blend of two 0xRRGGBB colours
pub fn lerp_color(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let channel = |shift: u32| {
        let from = ((a >> shift) & 0xff) as f32;
        let to = ((b >> shift) & 0xff) as f32;
        ((from + (to - from) * t).round() as u32) << shift
    };
    channel(16) | channel(8) | channel(0)
}

/// Background, line and X colours for a fault level; fully faulted at `MAX_FAULT`
pub fn screen_colors(fault: f32) -> (u32, u32, u32) {
    let t = (fault / MAX_FAULT).min(1.0);
    (
        lerp_color(BG_NORMAL, BG_FAULT, t),
        lerp_color(LINE_NORMAL, LINE_FAULT, t),
        lerp_color(X_NORMAL, X_FAULT, t),
    )
}

#[derive(Debug, Default)]
struct KeyboardState {
    armed_after_ms: Option<f64>,
    debounce: Debounce,
    fault: f32,
}

#[derive(Clone, Debug)]
struct Puff {
    body: BodyId,
    visual: VisualId,
    velocity: Vec2,
    born_ms: f64,
    lifespan_ms: f64,
}

pub struct Computer {
    state: Rc<RefCell<KeyboardState>>,
    screen: Option<VisualId>,
    cord: Option<(ConstraintId, VisualId)>,
    smoke: Vec<Puff>,
    smoke_frames: u32,
}

impl Computer {
    pub fn new() -> Self {
        Self {
            state: Rc::default(),
            screen: None,
            cord: None,
            smoke: Vec::new(),
            smoke_frames: 0,
        }
    }

    pub fn fault_level(&self) -> f32 {
        self.state.borrow().fault
    }

    /// Whether keyboard hits count yet
    pub fn is_armed(&self, now_ms: f64) -> bool {
        self.state.borrow().armed_after_ms.map_or(false, |t| now_ms >= t)
    }

    pub fn smoke_count(&self) -> usize {
        self.smoke.len()
    }

    pub fn smoke(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.smoke.iter().map(|p| p.body)
    }

    pub fn cord(&self) -> Option<ConstraintId> {
        self.cord.map(|(constraint, _)| constraint)
    }

    fn emit_smoke(&mut self, ctx: &mut FeatureContext<'_>, computer: BodyId) {
        self.smoke_frames += 1;
        if self.smoke_frames < SMOKE_EVERY_FRAMES {
            return;
        }
        self.smoke_frames = 0;
        let Some(center) = ctx.world.body(computer).map(|b| b.position) else {
            return;
        };
        let top = Vec2::new(center.x, center.y - COMPUTER_HALF_HEIGHT);

        for offset in SMOKE_PUFFS {
            let position = top + offset;
            let speed = ctx.rng.range_f32(SMOKE_SPEED.0, SMOKE_SPEED.1);
            let angle = ctx.rng.range_f32(SMOKE_ANGLE_DEG.0, SMOKE_ANGLE_DEG.1).to_radians();
            let lifespan_ms = ctx.rng.between(SMOKE_LIFESPAN_MS.0, SMOKE_LIFESPAN_MS.1) as f64;
            let body = ctx.world.create_dynamic_body(
                position,
                Shape::circle(SMOKE_RADIUS),
                BodyOptions {
                    is_sensor: true,
                    friction_air: 0.0,
                    ..BodyOptions::labelled(SMOKE_LABEL)
                },
            );
            let visual = ctx.scene.add(
                VisualKind::Sprite {
                    texture: SMOKE_LABEL.to_string(),
                },
                position,
                SMOKE_DEPTH,
            );
            ctx.scene.attach(visual, Attachment::new(body, false));
            self.smoke.push(Puff {
                body,
                visual,
                velocity: Vec2::from_angle(angle) * speed,
                born_ms: ctx.now_ms,
                lifespan_ms,
            });
        }
    }

    /// Expire old puffs and steer the rest. Puffs ignore gravity: their
    /// velocity is set so the step lands on the intended one.
    fn drift_smoke(&mut self, ctx: &mut FeatureContext<'_>) {
        let now = ctx.now_ms;
        let dt = (ctx.dt_ms / 1000.0) as f32;
        let gravity = ctx.world.gravity();
        let world = &mut *ctx.world;
        let scene = &mut *ctx.scene;

        self.smoke.retain(|puff| {
            let alive = now - puff.born_ms < puff.lifespan_ms && world.contains(puff.body);
            if !alive {
                world.remove_body(puff.body);
                scene.destroy(puff.visual);
            }
            alive
        });

        let sway = (now / 1000.0).sin() as f32 * SMOKE_SWAY;
        for puff in &mut self.smoke {
            puff.velocity.y -= SMOKE_LIFT * dt;
            let velocity = Vec2::new(puff.velocity.x + sway, puff.velocity.y);
            world.set_velocity(puff.body, velocity - gravity * dt);
            if let Some(visual) = scene.get_mut(puff.visual) {
                visual.alpha = (1.0 - (now - puff.born_ms) / puff.lifespan_ms).clamp(0.0, 1.0) as f32;
            }
        }
    }

    fn ensure_screen(&mut self, ctx: &mut FeatureContext<'_>, computer: BodyId) -> Option<VisualId> {
        if let Some(screen) = self.screen.filter(|s| ctx.scene.contains(*s)) {
            return Some(screen);
        }
        let position = ctx.world.body(computer)?.position + SCREEN_OFFSET;
        let (bg_color, line_color, x_color) = screen_colors(0.0);
        let screen = ctx.scene.add(
            VisualKind::Screen {
                width: SCREEN_SIZE.x,
                height: SCREEN_SIZE.y,
                fault: 0.0,
                bg_color,
                line_color,
                x_color,
            },
            position,
            SCREEN_DEPTH,
        );
        ctx.scene
            .attach(screen, Attachment::new(computer, true).with_offset(SCREEN_OFFSET));
        self.screen = Some(screen);
        Some(screen)
    }

    fn paint_screen(&mut self, ctx: &mut FeatureContext<'_>, computer: BodyId, level: f32) {
        let Some(visual) = self.ensure_screen(ctx, computer).and_then(|s| ctx.scene.get_mut(s)) else {
            return;
        };
        if let VisualKind::Screen {
            fault,
            bg_color,
            line_color,
            x_color,
            ..
        } = &mut visual.kind
        {
            *fault = level;
            (*bg_color, *line_color, *x_color) = screen_colors(level);
        }
    }

    fn update_cord(&mut self, ctx: &mut FeatureContext<'_>, computer: BodyId, keyboard: Option<BodyId>) {
        let Some(keyboard) = keyboard else {
            self.drop_cord(ctx);
            return;
        };
        let alive = self
            .cord
            .map_or(false, |(id, _)| ctx.world.constraints().iter().any(|c| c.id == id));
        if !alive {
            self.drop_cord(ctx);
            let constraint = ctx.world.add_constraint(ConstraintSpec {
                body_a: Some(computer),
                point_a: CORD_COMPUTER_OFFSET,
                body_b: keyboard,
                point_b: CORD_KEYBOARD_OFFSET,
                length: CORD_REST_LENGTH,
                stiffness: CORD_STIFFNESS,
            });
            let visual = ctx.scene.add(
                VisualKind::Cord {
                    from: Vec2::zero(),
                    to: Vec2::zero(),
                    coils: CORD_COILS,
                    coil_radius: CORD_COIL_RADIUS,
                    color: CORD_COLOR,
                    line_width: CORD_LINE_WIDTH,
                },
                Vec2::zero(),
                CORD_DEPTH,
            );
            self.cord = Some((constraint, visual));
        }

        let (Some(a), Some(b)) = (ctx.world.body(computer), ctx.world.body(keyboard)) else {
            return;
        };
        let start = a.position + CORD_COMPUTER_OFFSET.rotate(a.angle);
        let end = b.position + CORD_KEYBOARD_OFFSET.rotate(b.angle);
        let Some(visual) = self.cord.and_then(|(_, v)| ctx.scene.get_mut(v)) else {
            return;
        };
        visual.position = start;
        if let VisualKind::Cord { from, to, .. } = &mut visual.kind {
            *from = start;
            *to = end;
        }
    }

    fn drop_cord(&mut self, ctx: &mut FeatureContext<'_>) {
        if let Some((constraint, visual)) = self.cord.take() {
            ctx.world.remove_constraint(constraint);
            ctx.scene.destroy(visual);
        }
    }

    /// The computer is gone: clear its screen and cord, start over when it returns
    fn reset(&mut self, ctx: &mut FeatureContext<'_>) {
        if let Some(screen) = self.screen.take() {
            ctx.scene.destroy(screen);
        }
        self.drop_cord(ctx);
        self.smoke_frames = 0;
        *self.state.borrow_mut() = KeyboardState::default();
    }
}

impl Default for Computer {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for Computer {
    fn name(&self) -> &'static str {
        "computer"
    }

    fn install_handlers(&self, router: &mut CollisionRouter, _effects: &Effects) {
        let state = Rc::clone(&self.state);
        router.add_collision_handler(CollisionHandler::new(KEYBOARD_LABEL, true).on_start(
            move |ctx, _keyboard, _other| {
                let mut state = state.borrow_mut();
                if state.armed_after_ms.map_or(false, |t| ctx.now_ms >= t) {
                    state.debounce.hit(ctx.now_ms);
                }
            },
        ));
    }

    fn pre_update(&mut self, ctx: &mut FeatureContext<'_>) {
        match ctx.groups.body_of(COMPUTER_ID) {
            Some(computer) if ctx.world.contains(computer) => self.emit_smoke(ctx, computer),
            _ => self.smoke_frames = 0,
        }
        self.drift_smoke(ctx);
    }

    fn update(&mut self, ctx: &mut FeatureContext<'_>) {
        let computer = ctx.groups.body_of(COMPUTER_ID).filter(|b| ctx.world.contains(*b));
        let Some(computer) = computer else {
            if self.screen.is_some() || self.cord.is_some() || self.state.borrow().armed_after_ms.is_some() {
                self.reset(ctx);
            }
            return;
        };
        let keyboard = ctx.groups.body_of(KEYBOARD_ID).filter(|b| ctx.world.contains(*b));

        let level = {
            let mut state = self.state.borrow_mut();
            if state.armed_after_ms.is_none() {
                state.armed_after_ms = Some(ctx.now_ms + ARM_DELAY_MS);
            }
            if state.debounce.fire(ctx.now_ms) {
                state.fault = raise_fault(state.fault);
                log::debug!("keyboard hit, fault level {:.1}", state.fault);
            }
            state.fault
        };
        self.paint_screen(ctx, computer, level);
        self.update_cord(ctx, computer, keyboard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rng;
    use crate::domain::{GroupConfig, ItemConfig, ShapeLibrary};
    use crate::rigid_body_system::{Pair, PhysicsWorld};
    use crate::systems::collisions::CollisionPhase;
    use crate::systems::groups::{EngineContext, GroupManager};
    use crate::systems::scene::Scene;

    #[test]
    fn a_burst_of_hits_counts_once() {
        let mut debounce = Debounce::default();
        debounce.hit(0.0);
        debounce.hit(300.0);
        assert!(!debounce.fire(700.0));
        assert!(debounce.fire(800.0));
        assert!(!debounce.fire(900.0));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn fault_level_is_capped() {
        let mut level = 0.0;
        for _ in 0..20 {
            level = raise_fault(level);
        }
        assert!((level - MAX_FAULT).abs() < 1e-6);
        assert!((raise_fault(0.0) - FAULT_STEP).abs() < 1e-6);
    }

    #[test]
    fn screen_colours_follow_the_fault() {
        assert_eq!(screen_colors(0.0), (BG_NORMAL, LINE_NORMAL, X_NORMAL));
        assert_eq!(screen_colors(MAX_FAULT), (BG_FAULT, LINE_FAULT, X_FAULT));
        assert_eq!(screen_colors(1.0), (BG_FAULT, LINE_FAULT, X_FAULT));
        assert_eq!(lerp_color(0x000000, 0xff0000, 0.5), 0x800000);
    }

    struct Desk {
        world: PhysicsWorld,
        scene: Scene,
        groups: GroupManager,
        shapes: ShapeLibrary,
        router: CollisionRouter,
        effects: Effects,
        rng: Rng,
        feature: Computer,
        now_ms: f64,
    }

    impl Desk {
        fn new() -> Self {
            let mut world = PhysicsWorld::new(Vec2::zero());
            let mut scene = Scene::new();
            let mut shapes = ShapeLibrary::new();
            shapes.insert("Computer", Shape::rect(140.0, 150.0));
            shapes.insert("Keyboard", Shape::rect(80.0, 20.0));
            let mut groups = GroupManager::new();
            let mut router = CollisionRouter::default();
            let effects = Effects::new();
            let feature = Computer::new();
            feature.install_handlers(&mut router, &effects);
            let config = GroupConfig::new("computerGroup", Vec2::new(665.0, 825.0))
                .with_object(
                    ItemConfig::new("sprite", 227.0, 60.0)
                        .with_id(COMPUTER_ID)
                        .with_param("sprite", "computer")
                        .with_param("shapeName", "Computer"),
                )
                .with_object(
                    ItemConfig::new("sprite", 48.0, 123.0)
                        .with_id(KEYBOARD_ID)
                        .with_param("sprite", "keyboard")
                        .with_param("shapeName", "Keyboard"),
                );
            groups.create_group_from_config(&mut EngineContext::new(&mut world, &mut scene, &shapes), config);
            Self {
                world,
                scene,
                groups,
                shapes,
                router,
                effects,
                rng: Rng::new(3),
                feature,
                now_ms: 0.0,
            }
        }

        fn keyboard(&self) -> BodyId {
            self.groups.body_of(KEYBOARD_ID).unwrap()
        }

        fn tap_keyboard(&mut self) {
            let finger = self
                .world
                .create_dynamic_body(Vec2::new(0.0, 0.0), Shape::circle(2.0), BodyOptions::labelled("finger"));
            let pair = [Pair::new(self.keyboard(), finger)];
            self.router
                .dispatch(CollisionPhase::Start, &pair, &mut self.world, self.now_ms);
        }

        fn frame(&mut self, dt_ms: f64) {
            self.now_ms += dt_ms;
            let mut ctx = FeatureContext {
                world: &mut self.world,
                scene: &mut self.scene,
                groups: &mut self.groups,
                shapes: &self.shapes,
                effects: &self.effects,
                rng: &mut self.rng,
                now_ms: self.now_ms,
                dt_ms,
            };
            self.feature.pre_update(&mut ctx);
            self.feature.update(&mut ctx);
        }

        fn run(&mut self, ms: f64) {
            let frames = (ms / 16.0).ceil() as usize;
            for _ in 0..frames {
                self.frame(16.0);
            }
        }
    }

    #[test]
    fn hits_before_the_desk_settles_are_ignored() {
        let mut desk = Desk::new();
        desk.frame(16.0);
        desk.tap_keyboard();
        desk.run(1000.0);
        assert_eq!(desk.feature.fault_level(), 0.0);
        assert!(!desk.feature.is_armed(desk.now_ms));
    }

    #[test]
    fn two_quick_hits_raise_the_fault_once() {
        let mut desk = Desk::new();
        desk.run(2100.0);
        assert!(desk.feature.is_armed(desk.now_ms));

        desk.tap_keyboard();
        desk.run(200.0);
        desk.tap_keyboard();
        desk.run(1000.0);
        assert!((desk.feature.fault_level() - FAULT_STEP).abs() < 1e-6);
    }

    #[test]
    fn fault_never_exceeds_the_cap_and_reaches_the_screen() {
        let mut desk = Desk::new();
        desk.run(2100.0);
        for _ in 0..12 {
            desk.tap_keyboard();
            desk.run(600.0);
        }
        assert!((desk.feature.fault_level() - MAX_FAULT).abs() < 1e-6);

        let screen = desk
            .scene
            .visuals()
            .iter()
            .find(|v| matches!(v.kind, VisualKind::Screen { .. }))
            .unwrap();
        let VisualKind::Screen { fault, bg_color, .. } = &screen.kind else {
            unreachable!();
        };
        assert!((*fault - MAX_FAULT).abs() < 1e-6);
        assert_eq!(*bg_color, BG_FAULT);
    }

    #[test]
    fn smoke_puffs_are_sensors_that_rise_and_expire() {
        let mut desk = Desk::new();
        for _ in 0..SMOKE_EVERY_FRAMES {
            desk.frame(16.0);
        }
        assert_eq!(desk.feature.smoke_count(), SMOKE_PUFFS.len());
        let puffs: Vec<BodyId> = desk.feature.smoke().collect();
        for id in &puffs {
            let puff = desk.world.body(*id).unwrap();
            assert_eq!(puff.label, SMOKE_LABEL);
            assert!(puff.is_sensor);
            assert!(!puff.is_static);
            assert!(puff.position.y < 885.0 - COMPUTER_HALF_HEIGHT + 1.0);
        }

        // past the longest lifespan, with no new emission in between
        for _ in 0..40 {
            desk.frame(80.0);
        }
        assert!(puffs.iter().all(|id| !desk.world.contains(*id)));
    }

    #[test]
    fn cord_ties_the_keyboard_to_the_computer() {
        let mut desk = Desk::new();
        desk.frame(16.0);
        let cord = desk.feature.cord().unwrap();
        let constraint = desk.world.constraints().iter().find(|c| c.id == cord).unwrap();
        assert_eq!(constraint.body_a, desk.groups.body_of(COMPUTER_ID));
        assert_eq!(constraint.body_b, desk.keyboard());
        assert_eq!(constraint.length, CORD_REST_LENGTH);

        desk.groups
            .remove_machine_object(&mut desk.world, &mut desk.scene, KEYBOARD_ID);
        desk.frame(16.0);
        assert!(desk.feature.cord().is_none());
        assert!(desk.world.constraints().is_empty());
        assert!(!desk.scene.visuals().iter().any(|v| matches!(v.kind, VisualKind::Cord { .. })));
    }
}
