use crate::core::Vec2;
use crate::rigid_body::BodyId;
use crate::rigid_body_system::PhysicsWorld;

use super::visual::{Attachment, Visual, VisualId, VisualKind};

/// Display list. Owns every visual; nothing else destroys them.
#[derive(Debug)]
pub struct Scene {
    visuals: Vec<Visual>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            visuals: Vec::new(),
            next_id: 1,
        }
    }

    pub fn add(&mut self, kind: VisualKind, position: Vec2, depth: i32) -> VisualId {
        let id = VisualId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.visuals.push(Visual::new(id, kind, position, depth));
        id
    }

    pub fn get(&self, id: VisualId) -> Option<&Visual> {
        self.visuals.iter().find(|v| v.id == id)
    }

    pub fn get_mut(&mut self, id: VisualId) -> Option<&mut Visual> {
        self.visuals.iter_mut().find(|v| v.id == id)
    }

    pub fn contains(&self, id: VisualId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn visuals(&self) -> &[Visual] {
        &self.visuals
    }

    pub fn visuals_mut(&mut self) -> impl Iterator<Item = &mut Visual> {
        self.visuals.iter_mut()
    }

    /// Drop a visual along with its attachment. `false` if it was already gone.
    pub fn destroy(&mut self, id: VisualId) -> bool {
        let before = self.visuals.len();
        self.visuals.retain(|v| v.id != id);
        self.visuals.len() != before
    }

    /// Destroy every visual glued to `body`, returning how many went
    pub fn destroy_attached_to(&mut self, body: BodyId) -> usize {
        let before = self.visuals.len();
        self.visuals
            .retain(|v| v.attachment.map_or(true, |a| a.body != body));
        before - self.visuals.len()
    }

    pub fn attach(&mut self, id: VisualId, attachment: Attachment) -> bool {
        match self.get_mut(id) {
            Some(visual) => {
                visual.attachment = Some(attachment);
                true
            }
            None => false,
        }
    }

    pub fn attach_to_body(&mut self, id: VisualId, body: BodyId, match_rotation: bool) -> bool {
        self.attach(id, Attachment::new(body, match_rotation))
    }

    pub fn set_position(&mut self, id: VisualId, position: Vec2) {
        if let Some(visual) = self.get_mut(id) {
            visual.position = position;
        }
    }

    pub fn set_rotation(&mut self, id: VisualId, rotation: f32) {
        if let Some(visual) = self.get_mut(id) {
            visual.rotation = rotation;
        }
    }

    pub fn set_depth(&mut self, id: VisualId, depth: i32) {
        if let Some(visual) = self.get_mut(id) {
            visual.depth = depth;
        }
    }

    pub fn set_visible(&mut self, id: VisualId, visible: bool) {
        if let Some(visual) = self.get_mut(id) {
            visual.visible = visible;
        }
    }

    pub fn set_texture(&mut self, id: VisualId, new_texture: &str) {
        if let Some(visual) = self.get_mut(id) {
            match &mut visual.kind {
                VisualKind::Sprite { texture } | VisualKind::NineSlice { texture, .. } => {
                    texture.clear();
                    texture.push_str(new_texture);
                }
                _ => log::debug!("visual {:?} has no texture", id),
            }
        }
    }

    /// Copy body poses onto attached visuals. Attachments whose body no longer
    /// exists are dropped and the visual stays where it was last drawn.
    pub fn sync_attached(&mut self, world: &PhysicsWorld) {
        for visual in &mut self.visuals {
            let Some(attachment) = visual.attachment else {
                continue;
            };
            match world.body(attachment.body) {
                Some(body) => {
                    let offset = if attachment.match_rotation {
                        attachment.offset.rotate(body.angle)
                    } else {
                        attachment.offset
                    };
                    visual.position = body.position + offset;
                    if attachment.match_rotation {
                        visual.rotation = body.angle + attachment.rotation_offset;
                    }
                }
                None => visual.attachment = None,
            }
        }
    }

    /// Visuals in draw order: ascending depth, creation order within a depth
    pub fn draw_order(&self) -> Vec<&Visual> {
        let mut ordered: Vec<&Visual> = self.visuals.iter().filter(|v| v.visible).collect();
        ordered.sort_by_key(|v| v.depth);
        ordered
    }

    pub fn clear(&mut self) {
        self.visuals.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
