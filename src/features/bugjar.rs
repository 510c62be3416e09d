//! Bug jar: cracks a little more with every hit, breaks after `maxHits` and
//! then lets bugs crawl out

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{tween::wrap_angle, BuildError, Timer, Vec2};
use crate::domain::{BugjarConfig, ItemConfig};
use crate::rigid_body::{BodyId, BodyOptions, Shape};
use crate::systems::collisions::{CollisionHandler, CollisionRouter, Validator};
use crate::systems::groups::{Built, EngineContext, GroupInfo, GroupManager};
use crate::systems::scene::{Attachment, VisualId, VisualKind};

use super::{Effect, Effects, Feature, FeatureContext};

pub const BUGJAR_LABEL: &str = "bugjar";
pub const BUG_LABEL: &str = "bug";
const HIT_COOLDOWN_MS: f64 = 1000.0;
const MIN_SHARDS: u32 = 4;
const MAX_SHARDS: u32 = 15;
const BREAK_SHARDS: u32 = 12;
const LAST_TEXTURE: u32 = 5;
const MAX_BUGS: usize = 5;
const BUG_SPAWN_OFFSET: Vec2 = Vec2::new(-60.0, 20.0);
const BUG_SIZE: Vec2 = Vec2::new(40.0, 24.0);
const BUG_DEPTH: i32 = 200;

/// Walk speed, px/s
const BUG_SPEED: f32 = 30.0;
/// Per-frame chances
const STOP_CHANCE: f32 = 0.005;
const REVERSE_CHANCE: f32 = 0.003;
const MOVE_CHANCE: f32 = 0.01;
const JIGGLE_INTERVAL_MS: f64 = 2000.0;
/// Max spin kick of an upside-down bug, rad/s
const JIGGLE_STRENGTH: f32 = 12.0;
/// Vertical speed under which a bug counts as standing, px/s
const GROUNDED_SPEED: f32 = 0.6;

pub fn texture_for_hits(hits: u32) -> String {
    format!("bugjar_{}", (hits + 1).min(LAST_TEXTURE))
}

pub fn shards_for_hits(hits: u32, max_hits: u32) -> u32 {
    let max_hits = max_hits.max(1);
    let scaled = MIN_SHARDS + ((hits as f32 / max_hits as f32) * (MAX_SHARDS - MIN_SHARDS) as f32).floor() as u32;
    scaled.clamp(MIN_SHARDS, MAX_SHARDS)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Jar {
    pub body: BodyId,
    visual: VisualId,
    pub max_hits: u32,
    pub hits: u32,
    last_hit_ms: Option<f64>,
    pub broken: bool,
}

/// What a registered hit changed
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub hits: u32,
    pub texture: String,
    pub shards: u32,
    pub broke: bool,
}

impl Jar {
    fn new(body: BodyId, visual: VisualId, max_hits: u32) -> Self {
        Self {
            body,
            visual,
            max_hits: max_hits.max(1),
            hits: 0,
            last_hit_ms: None,
            broken: false,
        }
    }

    /// Register a hit at `now_ms`. `None` when broken or still cooling down.
    pub fn hit(&mut self, now_ms: f64) -> Option<Hit> {
        if self.broken {
            return None;
        }
        if self.last_hit_ms.map_or(false, |last| now_ms - last < HIT_COOLDOWN_MS) {
            return None;
        }
        self.last_hit_ms = Some(now_ms);
        self.hits += 1;
        let broke = self.hits >= self.max_hits;
        if broke {
            self.broken = true;
        }
        Some(Hit {
            hits: self.hits,
            texture: texture_for_hits(self.hits),
            shards: shards_for_hits(self.hits, self.max_hits),
            broke,
        })
    }
}

#[derive(Debug, Default)]
struct JarState {
    jars: Vec<Jar>,
    textures: Vec<(VisualId, String)>,
    broken: Vec<BodyId>,
}

#[derive(Clone, Debug)]
struct Bug {
    body: BodyId,
    visual: VisualId,
    /// 1 walks right, -1 left
    direction: f32,
    moving: bool,
    last_jiggle_ms: f64,
}

pub struct BugjarFeature {
    state: Rc<RefCell<JarState>>,
    spawner: Option<(BodyId, Timer)>,
    bugs: Vec<Bug>,
}

impl BugjarFeature {
    pub fn new() -> Self {
        Self {
            state: Rc::default(),
            spawner: None,
            bugs: Vec::new(),
        }
    }

    pub fn jar(&self, body: BodyId) -> Option<Jar> {
        self.state.borrow().jars.iter().find(|j| j.body == body).cloned()
    }

    pub fn bug_count(&self) -> usize {
        self.bugs.len()
    }

    pub fn is_spawning(&self) -> bool {
        self.spawner.is_some()
    }

    fn spawn_bug(&mut self, ctx: &mut FeatureContext<'_>, jar: BodyId) {
        let Some(position) = ctx.world.body(jar).map(|b| b.position + BUG_SPAWN_OFFSET) else {
            return;
        };
        let body = ctx.world.create_dynamic_body(
            position,
            Shape::rect(BUG_SIZE.x, BUG_SIZE.y),
            BodyOptions {
                restitution: 0.1,
                ..BodyOptions::labelled(BUG_LABEL)
            },
        );
        let visual = ctx.scene.add(
            VisualKind::Sprite {
                texture: BUG_LABEL.to_string(),
            },
            position,
            BUG_DEPTH,
        );
        if let Some(v) = ctx.scene.get_mut(visual) {
            v.flip_x = true;
        }
        ctx.scene.attach(visual, Attachment::new(body, true));
        self.bugs.push(Bug {
            body,
            visual,
            direction: -1.0,
            moving: true,
            last_jiggle_ms: 0.0,
        });
        log::debug!("bug {:?} crawled out of the jar", body);
    }

    fn walk_bugs(&mut self, ctx: &mut FeatureContext<'_>) {
        self.bugs.retain(|bug| ctx.world.contains(bug.body));
        for bug in &mut self.bugs {
            let Some(body) = ctx.world.body(bug.body) else {
                continue;
            };
            let velocity = body.velocity;
            let upside_down = {
                let a = wrap_angle(body.angle);
                !(a > -std::f32::consts::FRAC_PI_2 && a < std::f32::consts::FRAC_PI_2)
            };
            let grounded = velocity.y.abs() < GROUNDED_SPEED || ctx.world.pairs().iter().any(|p| p.contains(bug.body));

            if upside_down {
                if grounded {
                    ctx.world.set_velocity(bug.body, Vec2::new(0.0, velocity.y));
                    bug.moving = false;
                    if ctx.now_ms - bug.last_jiggle_ms > JIGGLE_INTERVAL_MS {
                        let kick = (ctx.rng.next_f32() - 0.5) * JIGGLE_STRENGTH;
                        if let Some(body) = ctx.world.body_mut(bug.body) {
                            body.angular_velocity = kick;
                        }
                        bug.last_jiggle_ms = ctx.now_ms;
                    }
                }
                continue;
            }

            if bug.moving {
                if ctx.rng.next_f32() < STOP_CHANCE {
                    bug.moving = false;
                } else if ctx.rng.next_f32() < REVERSE_CHANCE {
                    bug.direction = -bug.direction;
                }
            } else if ctx.rng.next_f32() < MOVE_CHANCE {
                bug.moving = true;
            }

            if grounded {
                let vx = if bug.moving { BUG_SPEED * bug.direction } else { 0.0 };
                ctx.world.set_velocity(bug.body, Vec2::new(vx, velocity.y));
            }
            if let Some(visual) = ctx.scene.get_mut(bug.visual) {
                visual.flip_x = bug.direction < 0.0;
            }
        }
    }
}

impl Default for BugjarFeature {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for BugjarFeature {
    fn name(&self) -> &'static str {
        "bugjar"
    }

    fn register_builders(&self, groups: &mut GroupManager) {
        let state = Rc::clone(&self.state);
        groups.add_object_builder("bugjar", move |ctx: &mut EngineContext<'_>, _group: &GroupInfo, item: &ItemConfig| {
            let (built, jar) = build_bugjar(ctx, item)?;
            state.borrow_mut().jars.push(jar);
            Ok(built)
        });
    }

    fn install_handlers(&self, router: &mut CollisionRouter, effects: &Effects) {
        let state = Rc::clone(&self.state);
        let effects = effects.clone();
        let handler = CollisionHandler::new(
            BUGJAR_LABEL,
            Validator::predicate(|body| body.label != "paddle" && body.label != BUG_LABEL),
        )
        .on_start(move |ctx, jar_body, _other| {
            let mut state = state.borrow_mut();
            let Some(jar) = state.jars.iter_mut().find(|j| j.body == jar_body) else {
                return;
            };
            let Some(hit) = jar.hit(ctx.now_ms) else {
                return;
            };
            let (visual, damage) = (jar.visual, jar.hits as f32 / jar.max_hits as f32);
            let position = ctx.world.body(jar_body).map_or(Vec2::zero(), |b| b.position);

            effects.emit(Effect::GlassShards {
                position,
                count: hit.shards,
                damage,
            });
            state.textures.push((visual, hit.texture));
            if hit.broke {
                log::info!("bug jar {:?} broke after {} hits", jar_body, hit.hits);
                state.textures.push((visual, format!("bugjar_{LAST_TEXTURE}")));
                state.broken.push(jar_body);
                effects.emit(Effect::GlassShards {
                    position,
                    count: BREAK_SHARDS,
                    damage,
                });
                effects.emit(Effect::BugjarBroken { position });
            }
        });
        router.add_collision_handler(handler);
    }

    fn pre_update(&mut self, ctx: &mut FeatureContext<'_>) {
        self.walk_bugs(ctx);
    }

    fn update(&mut self, ctx: &mut FeatureContext<'_>) {
        let (textures, broken) = {
            let mut state = self.state.borrow_mut();
            state.jars.retain(|j| ctx.world.contains(j.body));
            (std::mem::take(&mut state.textures), std::mem::take(&mut state.broken))
        };
        for (visual, texture) in textures {
            ctx.scene.set_texture(visual, &texture);
        }
        if self.spawner.is_none() {
            if let Some(jar) = broken.first() {
                let delay = ctx.rng.between(3000, 6000) as f64;
                self.spawner = Some((*jar, Timer::looping(delay)));
            }
        }

        let Some((jar, timer)) = self.spawner.as_mut() else {
            return;
        };
        let jar = *jar;
        if !ctx.world.contains(jar) {
            self.spawner = None;
            return;
        }
        if timer.tick(ctx.dt_ms) == 0 {
            return;
        }
        self.bugs.retain(|bug| ctx.world.contains(bug.body));
        if self.bugs.len() < MAX_BUGS {
            self.spawn_bug(ctx, jar);
        }
    }
}

fn build_bugjar(ctx: &mut EngineContext<'_>, item: &ItemConfig) -> Result<(Built, Jar), BuildError> {
    let config: BugjarConfig = item.typed()?;
    let position = item.position();
    let body = ctx.world.create_dynamic_body(
        position,
        Shape::rect(config.width, config.height),
        BodyOptions {
            restitution: 0.1,
            ..BodyOptions::labelled(BUGJAR_LABEL)
        },
    );
    let visual = ctx.scene.add(
        VisualKind::Sprite {
            texture: texture_for_hits(0),
        },
        position,
        0,
    );
    ctx.scene.attach(visual, Attachment::new(body, true));
    Ok((Built::with_body(body, visual), Jar::new(body, visual, config.max_hits)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rng;
    use crate::domain::{GroupConfig, ShapeLibrary};
    use crate::rigid_body_system::{Pair, PhysicsWorld};
    use crate::systems::collisions::CollisionPhase;
    use crate::systems::scene::Scene;

    #[test]
    fn shard_count_scales_with_damage() {
        assert_eq!(shards_for_hits(1, 4), 6);
        assert_eq!(shards_for_hits(2, 4), 9);
        assert_eq!(shards_for_hits(4, 4), 15);
        assert_eq!(shards_for_hits(9, 4), 15);
        assert_eq!(texture_for_hits(1), "bugjar_2");
        assert_eq!(texture_for_hits(7), "bugjar_5");
    }

    #[test]
    fn hits_respect_cooldown() {
        let mut jar = Jar::new(BodyId(1), VisualId(1), 4);
        assert!(jar.hit(0.0).is_some());
        assert!(jar.hit(500.0).is_none());
        assert_eq!(jar.hits, 1);
        assert!(jar.hit(1000.0).is_some());
        assert_eq!(jar.hits, 2);
    }

    #[test]
    fn breaks_exactly_once() {
        let mut jar = Jar::new(BodyId(1), VisualId(1), 2);
        assert!(!jar.hit(0.0).unwrap().broke);
        assert!(jar.hit(2000.0).unwrap().broke);
        assert!(jar.broken);
        assert_eq!(jar.hit(5000.0), None);
    }

    struct Shelf {
        world: PhysicsWorld,
        scene: Scene,
        groups: GroupManager,
        shapes: ShapeLibrary,
        router: CollisionRouter,
        effects: Effects,
        rng: Rng,
        feature: BugjarFeature,
    }

    impl Shelf {
        fn new(max_hits: u32) -> Self {
            let mut world = PhysicsWorld::new(Vec2::zero());
            let mut scene = Scene::new();
            let shapes = ShapeLibrary::new();
            let mut groups = GroupManager::new();
            let mut router = CollisionRouter::default();
            let effects = Effects::new();
            let feature = BugjarFeature::new();
            feature.register_builders(&mut groups);
            feature.install_handlers(&mut router, &effects);
            let config = GroupConfig::new("bugjarGroup", Vec2::new(300.0, 300.0)).with_object(
                ItemConfig::new("bugjar", 0.0, 0.0)
                    .with_id("bugjar")
                    .with_param("maxHits", max_hits),
            );
            groups.create_group_from_config(&mut EngineContext::new(&mut world, &mut scene, &shapes), config);
            Self {
                world,
                scene,
                groups,
                shapes,
                router,
                effects,
                rng: Rng::new(5),
                feature,
            }
        }

        fn jar_body(&self) -> BodyId {
            self.groups.body_of("bugjar").unwrap()
        }

        fn hit_with(&mut self, label: &str, now_ms: f64) {
            let other = self
                .world
                .create_dynamic_body(Vec2::new(300.0, 250.0), Shape::circle(5.0), BodyOptions::labelled(label));
            let pair = [Pair::new(self.jar_body(), other)];
            self.router.dispatch(CollisionPhase::Start, &pair, &mut self.world, now_ms);
        }

        fn update(&mut self, now_ms: f64, dt_ms: f64) {
            let mut ctx = FeatureContext {
                world: &mut self.world,
                scene: &mut self.scene,
                groups: &mut self.groups,
                shapes: &self.shapes,
                effects: &self.effects,
                rng: &mut self.rng,
                now_ms,
                dt_ms,
            };
            self.feature.pre_update(&mut ctx);
            self.feature.update(&mut ctx);
        }

        fn jar_texture(&self) -> String {
            let visual = self.groups.get_machine_object_by_id("bugjar").unwrap().visual();
            self.scene.get(visual).unwrap().texture().unwrap().to_string()
        }
    }

    #[test]
    fn paddles_and_bugs_never_count_as_hits() {
        let mut shelf = Shelf::new(4);
        shelf.hit_with("paddle", 0.0);
        shelf.hit_with(BUG_LABEL, 2000.0);
        assert_eq!(shelf.feature.jar(shelf.jar_body()).unwrap().hits, 0);
        assert!(shelf.effects.is_empty());
    }

    #[test]
    fn a_hit_cracks_the_jar() {
        let mut shelf = Shelf::new(4);
        assert_eq!(shelf.jar_texture(), "bugjar_1");
        shelf.hit_with("ball", 0.0);
        shelf.update(0.0, 16.0);

        assert_eq!(shelf.jar_texture(), "bugjar_2");
        assert_eq!(
            shelf.effects.drain(),
            vec![Effect::GlassShards {
                position: Vec2::new(300.0, 300.0),
                count: 6,
                damage: 0.25,
            }]
        );
    }

    #[test]
    fn broken_jar_releases_bugs() {
        let mut shelf = Shelf::new(1);
        shelf.hit_with("ball", 0.0);
        shelf.update(0.0, 16.0);
        assert_eq!(shelf.jar_texture(), "bugjar_5");
        assert!(shelf
            .effects
            .drain()
            .iter()
            .any(|e| matches!(e, Effect::BugjarBroken { .. })));
        assert!(shelf.feature.is_spawning());

        // 6 s covers the longest spawn delay
        for i in 0..40 {
            shelf.update(i as f64 * 1000.0, 1000.0);
        }
        assert_eq!(shelf.feature.bug_count(), MAX_BUGS);
        let bug = shelf.world.bodies().iter().find(|b| b.label == BUG_LABEL).unwrap();
        assert!(bug.position.approx_eq(Vec2::new(240.0, 320.0), 1e-4));
    }
}
