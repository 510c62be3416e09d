//! Dragging static items: group handles and static members

use crate::core::Vec2;
use crate::rigid_body::BodyId;

use super::clipboard::Clipboard;
use super::{DragContext, PointerEvent};

#[derive(Clone, Debug, PartialEq)]
enum Target {
    Handle { group: String },
    Member { id: String, group: String },
}

#[derive(Debug, Default)]
pub struct StaticItemDrag {
    target: Option<Target>,
    /// Pointer minus the grabbed body's position at pointer-down
    pointer_offset: Vec2,
}

impl StaticItemDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.target.is_some()
    }

    /// Id of the group being dragged
    pub fn group(&self) -> Option<&str> {
        match &self.target {
            Some(Target::Handle { group }) | Some(Target::Member { group, .. }) => Some(group),
            None => None,
        }
    }

    /// Grab the first static body under the pointer (world insertion order)
    pub fn pointer_down(&mut self, ctx: &mut DragContext<'_>, event: PointerEvent) -> bool {
        self.target = None;
        let picked: Option<BodyId> = ctx
            .world
            .intersect_point(event.position)
            .into_iter()
            .find(|id| ctx.world.body(*id).map_or(false, |b| b.is_static));
        let Some(body) = picked else {
            return false;
        };

        let target = if let Some(group) = ctx.groups.group_for_handle(body) {
            Target::Handle {
                group: group.id().to_string(),
            }
        } else if let Some(member) = ctx.groups.get_machine_object_by_body(body) {
            Target::Member {
                id: member.id().to_string(),
                group: member.group_id().to_string(),
            }
        } else {
            log::debug!("static body {:?} belongs to no group; not draggable", body);
            return false;
        };

        let position = ctx.world.body(body).map(|b| b.position).unwrap_or(event.position);
        self.pointer_offset = event.position - position;
        self.target = Some(target);
        true
    }

    pub fn pointer_move(&mut self, ctx: &mut DragContext<'_>, event: PointerEvent) {
        let Some(target) = &self.target else {
            return;
        };
        let position = event.position - self.pointer_offset;
        match target {
            Target::Handle { group } => {
                if event.modifier {
                    ctx.groups.reanchor_group(ctx.world, ctx.scene, group, position);
                } else {
                    ctx.groups.move_group_rigid(ctx.world, ctx.scene, group, position);
                }
            }
            Target::Member { id, .. } => {
                ctx.groups.move_member(ctx.world, ctx.scene, id, position);
            }
        }
    }

    /// Finish the drag and copy the edited group config to the clipboard.
    /// Returns the JSON that was offered to the clipboard.
    pub fn pointer_up(&mut self, ctx: &mut DragContext<'_>, clipboard: &dyn Clipboard) -> Option<String> {
        let target = self.target.take()?;
        let group_id = match &target {
            Target::Handle { group } | Target::Member { group, .. } => group,
        };

        let config = ctx.groups.serialize_group_config(group_id)?;
        let json = match config.to_json_pretty() {
            Ok(json) => json,
            Err(err) => {
                log::error!("Could not serialize group '{group_id}': {err}");
                return None;
            }
        };
        match clipboard.write_text(&json) {
            Ok(()) => log::info!("Group data '{group_id}' copied to clipboard"),
            Err(err) => log::error!("Could not copy text: {err}"),
        }
        Some(json)
    }
}
