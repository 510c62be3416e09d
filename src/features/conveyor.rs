//! Conveyor belt: pushes whatever rides on it to the right

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::core::{BuildError, Vec2};
use crate::domain::{ConveyorConfig, ItemConfig};
use crate::rigid_body::{BodyId, BodyOptions, Shape};
use crate::systems::collisions::{CollisionHandler, CollisionRouter, Validator};
use crate::systems::groups::{Built, EngineContext, GroupInfo, GroupManager};
use crate::systems::scene::{Attachment, VisualId, VisualKind};

use super::{Effects, Feature, FeatureContext};

pub const CONVEYOR_LABEL: &str = "conveyor";
/// Belt speed, px/s
pub const CONVEYOR_SPEED: f32 = 30.0;
const DASH_LENGTH: f32 = 10.0;
const GAP_LENGTH: f32 = 10.0;
/// Dash scroll per frame, px
const DASH_SCROLL: f32 = 0.35;
const ROLLERS: u32 = 12;

pub struct Conveyor {
    belts: Rc<RefCell<Vec<VisualId>>>,
    /// Friction of each riding body before it touched the belt
    riders: Rc<RefCell<HashMap<BodyId, f32>>>,
}

impl Conveyor {
    pub fn new() -> Self {
        Self {
            belts: Rc::new(RefCell::new(Vec::new())),
            riders: Rc::default(),
        }
    }

    /// Bodies currently riding with their friction saved
    pub fn rider_count(&self) -> usize {
        self.riders.borrow().len()
    }
}

impl Default for Conveyor {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for Conveyor {
    fn name(&self) -> &'static str {
        "conveyor"
    }

    fn register_builders(&self, groups: &mut GroupManager) {
        let belts = Rc::clone(&self.belts);
        groups.add_object_builder("conveyor", move |ctx: &mut EngineContext<'_>, _group: &GroupInfo, item: &ItemConfig| {
            let built = build_conveyor(ctx, item)?;
            belts.borrow_mut().push(built.visual);
            Ok(built)
        });
    }

    fn install_handlers(&self, router: &mut CollisionRouter, _effects: &Effects) {
        let on_start = Rc::clone(&self.riders);
        let on_end = Rc::clone(&self.riders);

        let handler = CollisionHandler::new(
            CONVEYOR_LABEL,
            Validator::predicate(|body| !body.is_static),
        )
        .on_start(move |ctx, _belt, rider| {
            let root = ctx.world.root_of(rider);
            if let Some(body) = ctx.world.body_mut(root) {
                on_start.borrow_mut().entry(root).or_insert(body.friction);
                body.friction = 0.0;
            }
        })
        .on_active(|ctx, _belt, rider| {
            let root = ctx.world.root_of(rider);
            let Some(vy) = ctx.world.body(rider).map(|b| b.velocity.y) else {
                return;
            };
            let Some(vx) = ctx.world.body(root).map(|b| b.velocity.x) else {
                return;
            };
            let pushed = (vx + CONVEYOR_SPEED).min(CONVEYOR_SPEED);
            ctx.world.set_velocity(root, Vec2::new(pushed, vy));
        })
        .on_end(move |ctx, _belt, rider| {
            let root = ctx.world.root_of(rider);
            let original = on_end.borrow_mut().remove(&root);
            if let (Some(friction), Some(body)) = (original, ctx.world.body_mut(root)) {
                body.friction = friction;
            }
        });
        router.add_collision_handler(handler);
    }

    fn update(&mut self, ctx: &mut FeatureContext<'_>) {
        // removed riders never see an `end`
        self.riders.borrow_mut().retain(|id, _| ctx.world.contains(*id));

        let mut belts = self.belts.borrow_mut();
        belts.retain(|id| ctx.scene.contains(*id));
        for id in belts.iter() {
            if let Some(visual) = ctx.scene.get_mut(*id) {
                if let VisualKind::Conveyor {
                    dash_offset,
                    dash_length,
                    gap_length,
                    ..
                } = &mut visual.kind
                {
                    *dash_offset = (*dash_offset + DASH_SCROLL) % (*dash_length + *gap_length);
                }
            }
        }
    }
}

fn build_conveyor(ctx: &mut EngineContext<'_>, item: &ItemConfig) -> Result<Built, BuildError> {
    let config: ConveyorConfig = item.typed()?;
    let position = item.position();
    let body = ctx.world.create_static_body(
        position,
        Shape::rect(config.w, config.h),
        BodyOptions::labelled(CONVEYOR_LABEL),
    );
    let visual = ctx.scene.add(
        VisualKind::Conveyor {
            width: config.w,
            height: config.h,
            rollers: ROLLERS,
            dash_length: DASH_LENGTH,
            gap_length: GAP_LENGTH,
            dash_offset: 0.0,
        },
        position,
        0,
    );
    ctx.scene.attach(visual, Attachment::new(body, false));
    Ok(Built::with_body(body, visual))
}
