//! Removes whatever fell far outside the frame

use crate::core::Vec2;
use crate::rigid_body::BodyId;
use crate::rigid_body_system::PhysicsWorld;
use crate::systems::groups::GroupManager;
use crate::systems::scene::Scene;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Culling {
    pub width: f32,
    pub height: f32,
    /// How far past the frame edge a body may go
    pub removal_distance: f32,
}

impl Culling {
    pub fn new(width: f32, height: f32, removal_distance: f32) -> Self {
        Self {
            width,
            height,
            removal_distance,
        }
    }

    pub fn is_out_of_bounds(&self, p: Vec2) -> bool {
        let d = self.removal_distance;
        p.x < -d || p.x > self.width + d || p.y < -d || p.y > self.height + d
    }

    /// Remove every out-of-bounds body and return how many were removed.
    /// Group members go through the group manager so their bookkeeping and
    /// secondary bodies go with them; free bodies are removed directly along
    /// with their attached visuals. Group handles and compound parts are
    /// never culled on their own.
    pub fn run(&self, world: &mut PhysicsWorld, scene: &mut Scene, groups: &mut GroupManager) -> usize {
        let lost: Vec<BodyId> = world
            .bodies()
            .iter()
            .filter(|b| b.parent.is_none() && self.is_out_of_bounds(b.position))
            .map(|b| b.id)
            .filter(|id| !groups.is_handle(*id))
            .collect();

        let mut removed = 0;
        for id in lost {
            if !world.contains(id) {
                continue;
            }
            match groups.get_machine_object_by_body(id).map(|o| o.id().to_string()) {
                Some(member) => {
                    groups.remove_machine_object(world, scene, &member);
                }
                None => {
                    scene.destroy_attached_to(id);
                    world.remove_body(id);
                }
            }
            removed += 1;
        }
        if removed > 0 {
            log::debug!("culled {removed} bodies outside the frame");
        }
        removed
    }
}
