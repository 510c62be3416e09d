//! Drag - pointer gestures over groups and swingable bodies
//!
//! Two independent drags see every pointer event. They never compete for the
//! same gesture: the static drag only grabs static bodies and the physics
//! drag only grabs dynamic ones.

mod clipboard;
mod physics_drag;
mod static_drag;

pub use clipboard::{BrowserClipboard, Clipboard, MemoryClipboard, NullClipboard};
pub use physics_drag::{PhysicsItemDrag, CENTER_NO_SWING_RATIO, GRAB_STIFFNESS};
pub use static_drag::StaticItemDrag;

use crate::core::Vec2;
use crate::rigid_body_system::PhysicsWorld;
use crate::systems::groups::GroupManager;
use crate::systems::scene::Scene;

/// Pointer sample in world coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerEvent {
    pub position: Vec2,
    /// Shift held: handle drags re-anchor instead of moving rigidly
    pub modifier: bool,
}

impl PointerEvent {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            modifier: false,
        }
    }

    pub fn with_modifier(mut self, modifier: bool) -> Self {
        self.modifier = modifier;
        self
    }
}

pub struct DragContext<'a> {
    pub world: &'a mut PhysicsWorld,
    pub scene: &'a mut Scene,
    pub groups: &'a mut GroupManager,
}

pub struct DragManager {
    static_drag: StaticItemDrag,
    physics_drag: PhysicsItemDrag,
    clipboard: Box<dyn Clipboard>,
}

impl DragManager {
    pub fn new(center_no_swing_ratio: f32, grab_stiffness: f32, clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            static_drag: StaticItemDrag::new(),
            physics_drag: PhysicsItemDrag::new(center_no_swing_ratio, grab_stiffness),
            clipboard,
        }
    }

    pub fn static_drag(&self) -> &StaticItemDrag {
        &self.static_drag
    }

    pub fn physics_drag(&self) -> &PhysicsItemDrag {
        &self.physics_drag
    }

    pub fn is_dragging(&self) -> bool {
        self.static_drag.is_dragging() || self.physics_drag.grabbed_body().is_some()
    }

    pub fn pointer_down(&mut self, ctx: &mut DragContext<'_>, event: PointerEvent) {
        self.static_drag.pointer_down(ctx, event);
        self.physics_drag.pointer_down(ctx.world, event);
    }

    pub fn pointer_move(&mut self, ctx: &mut DragContext<'_>, event: PointerEvent) {
        self.static_drag.pointer_move(ctx, event);
        self.physics_drag.pointer_move(ctx.world, event);
    }

    /// Returns the group JSON offered to the clipboard, if a static drag ended
    pub fn pointer_up(&mut self, ctx: &mut DragContext<'_>) -> Option<String> {
        self.physics_drag.pointer_up(ctx.world);
        self.static_drag.pointer_up(ctx, self.clipboard.as_ref())
    }
}

impl Default for DragManager {
    fn default() -> Self {
        Self::new(CENTER_NO_SWING_RATIO, GRAB_STIFFNESS, Box::new(BrowserClipboard))
    }
}
