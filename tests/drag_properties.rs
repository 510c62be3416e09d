use diorama_engine::core::Vec2;
use diorama_engine::rigid_body::{BodyOptions, Shape};
use diorama_engine::rigid_body_system::PhysicsWorld;
use diorama_engine::systems::drag::{DragContext, DragManager, NullClipboard, PointerEvent};
use diorama_engine::systems::groups::GroupManager;
use diorama_engine::systems::scene::Scene;

struct Desk {
    world: PhysicsWorld,
    scene: Scene,
    groups: GroupManager,
    drag: DragManager,
}

impl Desk {
    fn new() -> Self {
        Self {
            world: PhysicsWorld::new(Vec2::zero()),
            scene: Scene::new(),
            groups: GroupManager::new(),
            drag: DragManager::new(0.4, 0.2, Box::new(NullClipboard)),
        }
    }

    fn down(&mut self, x: f32, y: f32) {
        let mut ctx = DragContext {
            world: &mut self.world,
            scene: &mut self.scene,
            groups: &mut self.groups,
        };
        self.drag.pointer_down(&mut ctx, PointerEvent::at(x, y));
    }

    fn up(&mut self) -> Option<String> {
        let mut ctx = DragContext {
            world: &mut self.world,
            scene: &mut self.scene,
            groups: &mut self.groups,
        };
        self.drag.pointer_up(&mut ctx)
    }
}

#[test]
fn center_grab_never_adds_a_spring() {
    let mut desk = Desk::new();
    desk.world
        .create_dynamic_body(Vec2::new(200.0, 200.0), Shape::rect(100.0, 100.0), BodyOptions::labelled("box"));
    // max radius is ~70.7, so the dead zone is ~28.3
    for (x, y) in [(200.0, 200.0), (215.0, 210.0), (180.0, 190.0)] {
        desk.down(x, y);
        assert_eq!(desk.world.constraints().len(), 0, "grab at ({x}, {y})");
        assert_eq!(desk.up(), None);
    }
}

#[test]
fn off_center_grab_adds_exactly_one_spring_until_release() {
    let mut desk = Desk::new();
    let body = desk
        .world
        .create_dynamic_body(Vec2::new(200.0, 200.0), Shape::rect(100.0, 100.0), BodyOptions::labelled("box"));
    let before = desk.world.constraints().len();

    desk.down(240.0, 240.0);
    assert_eq!(desk.world.constraints().len(), before + 1);
    assert!(desk.world.has_constraint_on(body));

    desk.up();
    assert_eq!(desk.world.constraints().len(), before);
}

#[test]
fn static_bodies_never_swing() {
    let mut desk = Desk::new();
    desk.world
        .create_static_body(Vec2::new(200.0, 200.0), Shape::rect(100.0, 100.0), BodyOptions::labelled("shelf"));
    desk.down(245.0, 245.0);
    assert!(desk.world.constraints().is_empty());
    assert!(!desk.drag.is_dragging());
}
