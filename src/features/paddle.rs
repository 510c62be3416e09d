//! Paddles: static capsules the balls bounce along

use crate::core::BuildError;
use crate::domain::{ItemConfig, PaddleConfig};
use crate::rigid_body::{BodyOptions, Shape};
use crate::systems::groups::{Built, EngineContext, GroupInfo, GroupManager};
use crate::systems::scene::{Attachment, VisualKind};

use super::Feature;

pub const PADDLE_LABEL: &str = "paddle";
const PADDLE_FILL: u32 = 0x2d375b;
/// Outline of paddles the user may drag around
const DRAGGABLE_STROKE: u32 = 0x7fa6a3;

pub struct Paddles;

impl Feature for Paddles {
    fn name(&self) -> &'static str {
        "paddles"
    }

    fn register_builders(&self, groups: &mut GroupManager) {
        groups.add_object_builder("paddle", build_paddle);
    }
}

pub(crate) fn build_paddle(ctx: &mut EngineContext<'_>, _group: &GroupInfo, item: &ItemConfig) -> Result<Built, BuildError> {
    let config: PaddleConfig = item.typed()?;
    let position = item.position();

    let body = ctx.world.create_static_body(
        position,
        Shape::Capsule {
            width: config.w,
            height: config.h,
        },
        BodyOptions {
            angle: config.angle,
            user_draggable: config.user_draggable,
            ..BodyOptions::labelled(PADDLE_LABEL)
        },
    );

    let (fill, stroke) = if config.user_draggable {
        (None, Some(DRAGGABLE_STROKE))
    } else {
        (Some(PADDLE_FILL), None)
    };
    let visual = ctx.scene.add(
        VisualKind::RoundedRect {
            width: config.w,
            height: config.h,
            radius: config.h / 2.0,
            fill,
            stroke,
            line_width: 2.0,
        },
        position,
        0,
    );
    ctx.scene.set_rotation(visual, config.angle);
    ctx.scene.attach(visual, Attachment::new(body, true));

    Ok(Built::with_body(body, visual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Vec2;
    use crate::domain::{GroupConfig, ShapeLibrary};
    use crate::rigid_body_system::PhysicsWorld;
    use crate::systems::scene::Scene;

    #[test]
    fn paddle_lands_at_origin_plus_offset() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let mut scene = Scene::new();
        let shapes = ShapeLibrary::new();
        let mut groups = GroupManager::new();
        Paddles.register_builders(&mut groups);

        let config = GroupConfig::new("bookGroup", Vec2::new(400.0, 910.0)).with_object(
            ItemConfig::new("paddle", 150.0, 10.0)
                .with_id("bookBase")
                .with_param("w", 200)
                .with_param("h", 10),
        );
        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        groups.create_group_from_config(&mut ctx, config);

        let body = groups.body_of("bookBase").unwrap();
        let paddle = world.body(body).unwrap();
        assert!(paddle.position.approx_eq(Vec2::new(550.0, 920.0), 1e-4));
        assert!(paddle.is_static);
        assert_eq!(paddle.label, PADDLE_LABEL);
    }

    #[test]
    fn draggable_paddles_are_outlined() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let mut scene = Scene::new();
        let shapes = ShapeLibrary::new();
        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        let group = GroupInfo {
            id: "g".to_string(),
            origin: Vec2::zero(),
        };
        let item = ItemConfig::new("paddle", 10.0, 10.0)
            .with_param("w", 150)
            .with_param("h", 10)
            .with_param("angle", 0.5)
            .with_param("userDraggable", true);

        let built = build_paddle(&mut ctx, &group, &item).unwrap();
        let visual = scene.get(built.visual).unwrap();
        match &visual.kind {
            VisualKind::RoundedRect { fill, stroke, .. } => {
                assert_eq!(*fill, None);
                assert_eq!(*stroke, Some(DRAGGABLE_STROKE));
            }
            other => panic!("unexpected visual {other:?}"),
        }
        assert_eq!(visual.rotation, 0.5);
        assert!(world.body(built.body.unwrap()).unwrap().user_draggable);
    }

    #[test]
    fn missing_width_is_a_build_error() {
        let mut world = PhysicsWorld::new(Vec2::zero());
        let mut scene = Scene::new();
        let shapes = ShapeLibrary::new();
        let mut ctx = EngineContext::new(&mut world, &mut scene, &shapes);
        let group = GroupInfo {
            id: "g".to_string(),
            origin: Vec2::zero(),
        };
        let item = ItemConfig::new("paddle", 0.0, 0.0).with_param("h", 10);
        assert!(matches!(build_paddle(&mut ctx, &group, &item), Err(BuildError::Config(_))));
    }
}
