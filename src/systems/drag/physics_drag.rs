//! Swinging dynamic bodies on a soft spring

use crate::rigid_body::BodyId;
use crate::rigid_body_system::{ConstraintId, ConstraintSpec, PhysicsWorld};

use super::PointerEvent;

/// Share of a body's radius around its centroid where grabs are rejected
pub const CENTER_NO_SWING_RATIO: f32 = 0.4;
pub const GRAB_STIFFNESS: f32 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Grab {
    body: BodyId,
    constraint: ConstraintId,
}

#[derive(Debug)]
pub struct PhysicsItemDrag {
    center_no_swing_ratio: f32,
    stiffness: f32,
    grab: Option<Grab>,
}

impl PhysicsItemDrag {
    pub fn new(center_no_swing_ratio: f32, stiffness: f32) -> Self {
        Self {
            center_no_swing_ratio: center_no_swing_ratio.clamp(0.0, 1.0),
            stiffness,
            grab: None,
        }
    }

    pub fn grabbed_body(&self) -> Option<BodyId> {
        self.grab.map(|g| g.body)
    }

    /// Attach a spring to the first dynamic body under the pointer, unless
    /// the grab lands in the no-swing centre
    pub fn pointer_down(&mut self, world: &mut PhysicsWorld, event: PointerEvent) -> bool {
        self.release(world);

        let picked = world
            .intersect_point(event.position)
            .into_iter()
            .find_map(|id| world.body(id).filter(|b| !b.is_static));
        let Some(body) = picked else {
            return false;
        };

        let dist_to_center = event.position.distance(body.position);
        let swing_threshold = self.center_no_swing_ratio * body.max_radius();
        if dist_to_center < swing_threshold {
            log::debug!("grab on {:?} inside the no-swing centre; ignored", body.id);
            return false;
        }

        let spec = ConstraintSpec {
            body_a: None,
            point_a: event.position,
            body_b: body.id,
            point_b: body.world_to_local(event.position),
            length: 0.0,
            stiffness: self.stiffness,
        };
        let body_id = body.id;
        let constraint = world.add_constraint(spec);
        self.grab = Some(Grab {
            body: body_id,
            constraint,
        });
        true
    }

    pub fn pointer_move(&mut self, world: &mut PhysicsWorld, event: PointerEvent) {
        let Some(grab) = self.grab else {
            return;
        };
        match world.constraint_mut(grab.constraint) {
            Some(constraint) => constraint.point_a = event.position,
            // body went away (culled) and took the spring with it
            None => self.grab = None,
        }
    }

    pub fn pointer_up(&mut self, world: &mut PhysicsWorld) {
        self.release(world);
    }

    fn release(&mut self, world: &mut PhysicsWorld) {
        if let Some(grab) = self.grab.take() {
            world.remove_constraint(grab.constraint);
        }
    }
}

impl Default for PhysicsItemDrag {
    fn default() -> Self {
        Self::new(CENTER_NO_SWING_RATIO, GRAB_STIFFNESS)
    }
}
