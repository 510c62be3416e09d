use crate::systems::drag::{DragContext, PointerEvent};

use super::DioramaCore;

pub(super) fn pointer_down(core: &mut DioramaCore, event: PointerEvent) {
    if core.destroyed {
        return;
    }
    let mut ctx = DragContext {
        world: &mut core.world,
        scene: &mut core.scene,
        groups: &mut core.groups,
    };
    core.drag.pointer_down(&mut ctx, event);
}

pub(super) fn pointer_move(core: &mut DioramaCore, event: PointerEvent) {
    if core.destroyed || !core.drag.is_dragging() {
        return;
    }
    let mut ctx = DragContext {
        world: &mut core.world,
        scene: &mut core.scene,
        groups: &mut core.groups,
    };
    core.drag.pointer_move(&mut ctx, event);
    // dragged statics are placed directly; keep their visuals in step
    core.scene.sync_attached(&core.world);
}

pub(super) fn pointer_up(core: &mut DioramaCore) -> Option<String> {
    if core.destroyed {
        return None;
    }
    let mut ctx = DragContext {
        world: &mut core.world,
        scene: &mut core.scene,
        groups: &mut core.groups,
    };
    core.drag.pointer_up(&mut ctx)
}
