//! Coffee machine: a ball hitting it drops a cup, cups get filled under the
//! spout, full cups splash when they hit something or tip over on a spring

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use crate::core::Vec2;
use crate::rigid_body::{BodyId, BodyOptions, Shape};
use crate::systems::collisions::{CollisionHandler, CollisionRouter, Validator};
use crate::systems::scene::{Attachment, VisualKind};

use super::{Effect, Effects, Feature, FeatureContext};

pub const CUP_LABEL: &str = "coffeeCup";
pub const MACHINE_ID: &str = "coffeeMachine";
const MACHINE_LABEL: &str = "coffeeMachine";
const CUP_SHAPE: &str = "Cup";
const CUP_DEPTH: i32 = 150;
/// Cup spawn point below the machine body
const CUP_SPAWN_OFFSET: Vec2 = Vec2::new(0.0, 30.0);
/// Cups younger than this never splash
const MIN_SPLASH_AGE_MS: f64 = 2000.0;
/// Radians of tilt that spill a swinging cup
const TILT_SPLASH_THRESHOLD: f32 = 0.72;
/// Pour window, x relative to the machine body
const POUR_X_MIN: f32 = 50.0;
const POUR_X_MAX: f32 = 80.0;
const SPOUT_OFFSET: Vec2 = Vec2::new(63.0, 3.0);
const JIGGLE_AMPLITUDE: f32 = 1.0 * std::f32::consts::PI / 180.0;
/// Half a jiggle swing, ms
const JIGGLE_LEG_MS: f64 = 20.0;
/// One swing out and back, three times
const JIGGLE_TOTAL_MS: f64 = JIGGLE_LEG_MS * 2.0 * 3.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Cup {
    pub has_coffee: bool,
    pub created_ms: f64,
    poured: bool,
    tilt_splashed: bool,
}

#[derive(Debug, Default)]
struct CoffeeState {
    cups: BTreeMap<BodyId, Cup>,
    pending_cups: u32,
    jiggle_ms: Option<f64>,
}

pub struct Coffee {
    state: Rc<RefCell<CoffeeState>>,
}

impl Coffee {
    pub fn new() -> Self {
        Self {
            state: Rc::default(),
        }
    }

    pub fn cup(&self, body: BodyId) -> Option<Cup> {
        self.state.borrow().cups.get(&body).cloned()
    }

    pub fn cup_count(&self) -> usize {
        self.state.borrow().cups.len()
    }

    /// Track `body` as a cup; returns false if it is already one
    pub fn track_cup(&self, body: BodyId, now_ms: f64) -> bool {
        let mut state = self.state.borrow_mut();
        if state.cups.contains_key(&body) {
            return false;
        }
        state.cups.insert(
            body,
            Cup {
                has_coffee: false,
                created_ms: now_ms,
                poured: false,
                tilt_splashed: false,
            },
        );
        true
    }

    fn spawn_cups(&self, ctx: &mut FeatureContext<'_>) {
        let pending = std::mem::take(&mut self.state.borrow_mut().pending_cups);
        if pending == 0 {
            return;
        }
        let Some(machine) = machine_position(ctx) else {
            log::warn!("no `{MACHINE_ID}` to spawn cups under");
            return;
        };
        let shape = match ctx.shapes.get(CUP_SHAPE) {
            Some(shape) => shape.clone(),
            None => {
                log::warn!("shape `{CUP_SHAPE}` missing, using a box");
                Shape::rect(30.0, 30.0)
            }
        };
        let position = machine + CUP_SPAWN_OFFSET;
        for _ in 0..pending {
            let body = ctx
                .world
                .create_dynamic_body(position, shape.clone(), BodyOptions::labelled(CUP_LABEL));
            let visual = ctx.scene.add(
                VisualKind::Sprite {
                    texture: CUP_LABEL.to_string(),
                },
                position,
                CUP_DEPTH,
            );
            ctx.scene.attach(visual, Attachment::new(body, true));
            self.track_cup(body, ctx.now_ms);
        }
    }

    fn jiggle_machine(&self, ctx: &mut FeatureContext<'_>) {
        let Some(elapsed) = self.state.borrow().jiggle_ms else {
            return;
        };
        let Some(body) = ctx.groups.body_of(MACHINE_ID) else {
            self.state.borrow_mut().jiggle_ms = None;
            return;
        };
        let elapsed = elapsed + ctx.dt_ms;
        if elapsed >= JIGGLE_TOTAL_MS {
            ctx.world.set_angle(body, 0.0);
            self.state.borrow_mut().jiggle_ms = None;
            return;
        }
        // triangle wave between -amplitude and +amplitude
        let phase = (elapsed % (2.0 * JIGGLE_LEG_MS)) / JIGGLE_LEG_MS;
        let t = (if phase <= 1.0 { phase } else { 2.0 - phase }) as f32;
        ctx.world.set_angle(body, -JIGGLE_AMPLITUDE + 2.0 * JIGGLE_AMPLITUDE * t);
        self.state.borrow_mut().jiggle_ms = Some(elapsed);
    }

    fn pour_and_spill(&self, ctx: &mut FeatureContext<'_>) {
        let machine = machine_position(ctx);
        let mut state = self.state.borrow_mut();
        state.cups.retain(|body, _| ctx.world.contains(*body));

        for (id, cup) in state.cups.iter_mut() {
            let Some(body) = ctx.world.body(*id) else {
                continue;
            };

            if let Some(machine) = machine {
                let rel_x = body.position.x - machine.x;
                let under_spout = (POUR_X_MIN..=POUR_X_MAX).contains(&rel_x);
                if !cup.has_coffee && !cup.poured && under_spout {
                    ctx.effects.emit(Effect::CoffeePour {
                        position: machine + SPOUT_OFFSET,
                    });
                    cup.has_coffee = true;
                    cup.poured = true;
                }
                if cup.poured && !under_spout {
                    cup.poured = false;
                }
            }

            if !cup.has_coffee {
                continue;
            }
            if ctx.world.has_constraint_on(*id) {
                if !cup.tilt_splashed && body.angle.abs() > TILT_SPLASH_THRESHOLD {
                    let normal = Vec2::new(body.angle.sin(), body.angle.cos()) * 0.5;
                    ctx.effects.emit(Effect::CoffeeSplash {
                        position: body.position,
                        angle_deg: (normal.y.atan2(normal.x) + body.angle).to_degrees(),
                        speed_min: 10.0,
                        speed_max: 50.0,
                    });
                    cup.has_coffee = false;
                    cup.tilt_splashed = true;
                }
            } else {
                cup.tilt_splashed = false;
            }
        }
    }
}

impl Default for Coffee {
    fn default() -> Self {
        Self::new()
    }
}

fn machine_position(ctx: &FeatureContext<'_>) -> Option<Vec2> {
    let body = ctx.groups.body_of(MACHINE_ID)?;
    ctx.world.body(body).map(|b| b.position)
}

impl Feature for Coffee {
    fn name(&self) -> &'static str {
        "coffee"
    }

    fn install_handlers(&self, router: &mut CollisionRouter, effects: &Effects) {
        // a full cup hitting anything old enough splashes
        let full = Rc::clone(&self.state);
        let splash = Rc::clone(&self.state);
        let effects = effects.clone();
        router.add_collision_handler(
            CollisionHandler::new(
                Validator::predicate(move |body| {
                    body.label == CUP_LABEL && full.borrow().cups.get(&body.id).map_or(false, |c| c.has_coffee)
                }),
                Validator::Any,
            )
            .on_start(move |ctx, cup_body, _other| {
                let mut state = splash.borrow_mut();
                let Some(cup) = state.cups.get_mut(&cup_body) else {
                    return;
                };
                if ctx.now_ms - cup.created_ms < MIN_SPLASH_AGE_MS {
                    return;
                }
                if let Some(body) = ctx.world.body(cup_body) {
                    effects.emit(Effect::CoffeeSplash {
                        position: body.position,
                        angle_deg: (body.angle - FRAC_PI_2).to_degrees(),
                        speed_min: 160.0,
                        speed_max: 200.0,
                    });
                }
                cup.has_coffee = false;
            }),
        );

        // ball hits the machine: jiggle it and queue a cup
        let hits = Rc::clone(&self.state);
        router.add_collision_handler(CollisionHandler::new("ball", MACHINE_LABEL).on_start(move |_ctx, _ball, _machine| {
            let mut state = hits.borrow_mut();
            state.pending_cups += 1;
            state.jiggle_ms = Some(0.0);
        }));
    }

    fn update(&mut self, ctx: &mut FeatureContext<'_>) {
        self.spawn_cups(ctx);
        self.jiggle_machine(ctx);
        self.pour_and_spill(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rng;
    use crate::domain::{GroupConfig, ItemConfig, ShapeLibrary};
    use crate::rigid_body_system::{ConstraintSpec, Pair, PhysicsWorld};
    use crate::systems::collisions::CollisionPhase;
    use crate::systems::groups::{EngineContext, GroupManager};
    use crate::systems::scene::Scene;

    struct Desk {
        world: PhysicsWorld,
        scene: Scene,
        groups: GroupManager,
        shapes: ShapeLibrary,
        router: CollisionRouter,
        effects: Effects,
        rng: Rng,
        coffee: Coffee,
    }

    impl Desk {
        fn new() -> Self {
            let mut world = PhysicsWorld::new(Vec2::zero());
            let mut scene = Scene::new();
            let shapes = ShapeLibrary::builtin().unwrap();
            let mut groups = GroupManager::new();
            let config = GroupConfig::new("coffeeGroup", Vec2::new(100.0, 100.0)).with_object(
                ItemConfig::new("static", 0.0, 0.0)
                    .with_id(MACHINE_ID)
                    .with_param("shapeName", "coffeeMachine")
                    .with_param("label", MACHINE_LABEL),
            );
            groups.create_group_from_config(&mut EngineContext::new(&mut world, &mut scene, &shapes), config);

            let mut router = CollisionRouter::default();
            let effects = Effects::new();
            let coffee = Coffee::new();
            coffee.install_handlers(&mut router, &effects);
            Self {
                world,
                scene,
                groups,
                shapes,
                router,
                effects,
                rng: Rng::new(3),
                coffee,
            }
        }

        fn update(&mut self, now_ms: f64) {
            let mut ctx = FeatureContext {
                world: &mut self.world,
                scene: &mut self.scene,
                groups: &mut self.groups,
                shapes: &self.shapes,
                effects: &self.effects,
                rng: &mut self.rng,
                now_ms,
                dt_ms: 16.0,
            };
            self.coffee.update(&mut ctx);
        }

        fn machine(&self) -> BodyId {
            self.groups.body_of(MACHINE_ID).unwrap()
        }

        fn cup_at(&mut self, position: Vec2, now_ms: f64) -> BodyId {
            let body = self
                .world
                .create_dynamic_body(position, Shape::rect(30.0, 30.0), BodyOptions::labelled(CUP_LABEL));
            self.coffee.track_cup(body, now_ms);
            body
        }
    }

    #[test]
    fn ball_hit_spawns_a_cup_under_the_machine() {
        let mut desk = Desk::new();
        let ball = desk
            .world
            .create_dynamic_body(Vec2::new(100.0, 80.0), Shape::circle(10.0), BodyOptions::labelled("ball"));
        let pair = [Pair::new(ball, desk.machine())];
        desk.router.dispatch(CollisionPhase::Start, &pair, &mut desk.world, 0.0);
        desk.update(0.0);

        assert_eq!(desk.coffee.cup_count(), 1);
        let cup = desk.world.bodies().iter().find(|b| b.label == CUP_LABEL).unwrap();
        assert!(cup.position.approx_eq(Vec2::new(100.0, 130.0), 1e-4));
        assert_ne!(desk.world.body(desk.machine()).unwrap().angle, 0.0);

        for i in 1..10 {
            desk.update(i as f64 * 16.0);
        }
        assert_eq!(desk.world.body(desk.machine()).unwrap().angle, 0.0);
    }

    #[test]
    fn cup_under_spout_is_poured_once() {
        let mut desk = Desk::new();
        let cup = desk.cup_at(Vec2::new(165.0, 130.0), 0.0);
        desk.update(0.0);
        desk.update(16.0);

        let pours: Vec<_> = desk
            .effects
            .drain()
            .into_iter()
            .filter(|e| matches!(e, Effect::CoffeePour { .. }))
            .collect();
        assert_eq!(
            pours,
            vec![Effect::CoffeePour {
                position: Vec2::new(163.0, 103.0)
            }]
        );
        assert!(desk.coffee.cup(cup).unwrap().has_coffee);
    }

    #[test]
    fn young_cups_do_not_splash() {
        let mut desk = Desk::new();
        let cup = desk.cup_at(Vec2::new(165.0, 130.0), 0.0);
        desk.update(0.0);
        desk.effects.drain();
        let floor = desk.world.create_static_body(Vec2::new(165.0, 160.0), Shape::rect(100.0, 10.0), BodyOptions::default());
        let pair = [Pair::new(cup, floor)];

        desk.router.dispatch(CollisionPhase::Start, &pair, &mut desk.world, 1000.0);
        assert!(desk.effects.is_empty());
        assert!(desk.coffee.cup(cup).unwrap().has_coffee);

        desk.router.dispatch(CollisionPhase::Start, &pair, &mut desk.world, 2500.0);
        assert!(matches!(desk.effects.drain()[..], [Effect::CoffeeSplash { .. }]));
        assert!(!desk.coffee.cup(cup).unwrap().has_coffee);
    }

    #[test]
    fn swinging_cup_spills_when_tilted() {
        let mut desk = Desk::new();
        let cup = desk.cup_at(Vec2::new(165.0, 130.0), 0.0);
        desk.update(0.0);
        desk.effects.drain();

        desk.world.add_constraint(ConstraintSpec {
            body_a: None,
            point_a: Vec2::new(165.0, 110.0),
            body_b: cup,
            point_b: Vec2::new(0.0, -10.0),
            length: 0.0,
            stiffness: 0.2,
        });
        desk.world.set_angle(cup, 0.9);
        desk.update(16.0);

        assert!(matches!(desk.effects.drain()[..], [Effect::CoffeeSplash { .. }]));
        assert!(!desk.coffee.cup(cup).unwrap().has_coffee);
    }

    #[test]
    fn removed_cups_are_forgotten() {
        let mut desk = Desk::new();
        let cup = desk.cup_at(Vec2::new(400.0, 400.0), 0.0);
        desk.world.remove_body(cup);
        desk.update(16.0);
        assert_eq!(desk.coffee.cup_count(), 0);
    }
}
