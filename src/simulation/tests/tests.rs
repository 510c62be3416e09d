use super::*;
use crate::domain::ItemConfig;
use crate::rigid_body::{BodyOptions, Shape};
use crate::systems::drag::MemoryClipboard;
use crate::systems::scene::VisualKind;

fn empty_core() -> DioramaCore {
    DioramaCore::new(DioramaSettings::default()).unwrap()
}

#[test]
fn default_scene_creates_every_group() {
    let mut core = empty_core();
    assert_eq!(core.load_default_scene().unwrap(), 7);
    assert_eq!(core.groups().groups().len(), 7);
    for id in ["coffeeMachine", "coffeeConveyor", "fanBlades", "book0", "bugjar", "robotArm", "paddle1", "computer", "keyboard"] {
        assert!(core.groups().get_machine_object_by_id(id).is_some(), "missing {id}");
    }
    assert_eq!(core.features().robot_arms.len(), 1);
}

#[test]
fn default_scene_survives_a_few_seconds() {
    let mut core = empty_core();
    core.load_default_scene().unwrap();
    for _ in 0..300 {
        core.update(1000.0 / 60.0);
    }
    assert_eq!(core.frame(), 300);
    assert!(core.features().balls.ball_count() >= 1);
    assert!(core.render_json().unwrap().contains("\"visuals\""));
}

#[test]
fn frame_time_is_capped() {
    let mut core = empty_core();
    core.update(1000.0);
    assert_eq!(core.time_ms(), MAX_STEP_MS);
    core.update(-5.0);
    core.update(f64::NAN);
    assert_eq!(core.frame(), 1);
}

#[test]
fn balls_fall_under_gravity() {
    let settings = DioramaSettings {
        ball_spawn_interval_ms: 16.0,
        max_balls: Some(1),
        ..DioramaSettings::default()
    };
    let mut core = DioramaCore::new(settings).unwrap();
    core.update(16.0);
    let ball = core.features().balls.balls().next().unwrap();
    let start = core.world().body(ball).unwrap().position;
    for _ in 0..10 {
        core.update(16.0);
    }
    let now = core.world().body(ball).unwrap().position;
    assert!(now.y > start.y);
    // visuals follow their bodies after every update
    let sprite = core.scene().visuals().iter().find(|v| v.texture() == Some("ball")).unwrap();
    assert!(sprite.position.approx_eq(now, 1e-3));
}

#[test]
fn lost_bodies_are_culled() {
    let mut core = empty_core();
    let lost = core
        .world_mut()
        .create_dynamic_body(Vec2::new(500.0, 5000.0), Shape::circle(10.0), BodyOptions::labelled("ball"));
    core.update(16.0);
    assert!(!core.world().contains(lost));
}

#[test]
fn handle_drag_moves_group_and_copies_config() {
    let clipboard = MemoryClipboard::new();
    let mut core = DioramaCore::with_clipboard(DioramaSettings::default(), Box::new(clipboard.clone())).unwrap();
    let config = GroupConfig::new("shelf", Vec2::new(600.0, 600.0)).with_handle(true).with_object(
        ItemConfig::new("static", 50.0, 0.0)
            .with_id("plank")
            .with_param("shape", serde_json::json!({"type": "rectangle", "width": 40, "height": 10})),
    );
    core.load_group(config);

    core.pointer_down(PointerEvent::at(600.0, 600.0));
    core.pointer_move(PointerEvent::at(650.0, 620.0));
    let json = core.pointer_up().unwrap();

    let edited = GroupConfig::from_json(&json).unwrap();
    assert_eq!(edited.origin, Vec2::new(650.0, 620.0));
    assert_eq!(edited.objects[0].x, 50.0);
    assert_eq!(clipboard.last_text(), Some(json));

    let plank = core.groups().body_of("plank").unwrap();
    assert!(core.world().body(plank).unwrap().position.approx_eq(Vec2::new(700.0, 620.0), 1e-4));
}

#[test]
fn render_extract_drains_effects() {
    let mut core = empty_core();
    core.effects.emit(Effect::FanMaxed);
    let first = core.render_json().unwrap();
    assert!(first.contains("fanMaxed"));
    let second = core.render_json().unwrap();
    assert!(!second.contains("fanMaxed"));
}

#[test]
fn effects_go_out_in_one_frame_only() {
    let mut core = empty_core();
    core.effects.emit(Effect::FanMaxed);
    assert_eq!(core.render_frame().effects, vec![Effect::FanMaxed]);
    assert!(core.drain_effects().is_empty());
}

#[test]
fn render_frame_reports_the_fault_level() {
    let mut core = empty_core();
    core.load_default_scene().unwrap();
    core.update(16.0);
    assert_eq!(core.render_frame().fault_level, 0.0);
    let json = core.render_json().unwrap();
    assert!(json.contains("\"faultLevel\":0.0"), "{json}");
    assert!(json.contains("\"kind\":\"screen\""));
    assert!(json.contains("\"kind\":\"cord\""));
}

#[test]
fn handlers_and_builders_register_on_the_live_scene() {
    let mut core = empty_core();
    let added = core.add_object_builder("crate", |ctx, _group, item| {
        let visual = ctx.scene.add(VisualKind::Sprite { texture: "crate".to_string() }, item.position(), 0);
        Ok(Built::visual(visual))
    });
    assert!(added);
    core.load_group(GroupConfig::new("stack", Vec2::new(10.0, 10.0)).with_object(ItemConfig::new("crate", 0.0, 0.0).with_id("box")));
    assert!(core.groups().get_machine_object_by_id("box").is_some());

    let id = core.add_collision_handler(CollisionHandler::new("never", true));
    assert!(core.router().contains(id));
    assert_eq!(core.remove_collision_handler(id), Removal::Removed);
    assert!(!core.router().contains(id));
}

#[test]
fn debug_mode_exports_body_outlines() {
    let mut core = empty_core();
    core.world_mut()
        .create_static_body(Vec2::new(10.0, 10.0), Shape::rect(20.0, 20.0), BodyOptions::labelled("shelf"));
    assert!(core.render_frame().bodies.is_empty());
    core.set_debug(true);
    let frame = core.render_frame();
    assert_eq!(frame.bodies.len(), 1);
    assert_eq!(frame.bodies[0].label, "shelf");
}

#[test]
fn malformed_group_json_is_an_error() {
    let mut core = empty_core();
    assert!(core.load_group_json("{\"id\": ").is_err());
    assert!(core.groups().groups().is_empty());
}

#[test]
fn unknown_group_config_is_an_error() {
    let core = empty_core();
    assert!(matches!(core.group_config_json("nope"), Err(DioramaError::UnknownGroup(_))));
}

#[test]
fn destroy_is_idempotent() {
    let mut core = empty_core();
    core.load_default_scene().unwrap();
    core.update(16.0);
    core.destroy();
    core.destroy();
    assert!(core.is_destroyed());
    assert_eq!(core.world().body_count(), 0);
    assert!(core.scene().is_empty());

    core.update(16.0);
    core.pointer_down(PointerEvent::at(100.0, 100.0));
    assert_eq!(core.frame(), 1);
    assert_eq!(core.pointer_up(), None);
}
