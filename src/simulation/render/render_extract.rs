use serde::Serialize;

use crate::core::{DioramaResult, Vec2};
use crate::features::Effect;
use crate::rigid_body::{BodyId, Shape};
use crate::systems::scene::Visual;

use super::DioramaCore;

/// Everything the page needs to draw one frame
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame<'a> {
    pub frame: u64,
    pub time_ms: f64,
    /// Visible visuals, back to front
    pub visuals: Vec<&'a Visual>,
    pub effects: Vec<Effect>,
    /// Computer screen glitch level, 0 when there is no computer
    pub fault_level: f32,
    /// Collider outlines, only in debug mode
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bodies: Vec<DebugBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugBody<'a> {
    pub id: BodyId,
    pub label: &'a str,
    pub position: Vec2,
    pub angle: f32,
    pub shape: &'a Shape,
    pub is_static: bool,
    pub is_sensor: bool,
}

/// Takes the pending effects, so each one is handed out in exactly one frame
pub(super) fn extract_frame(core: &mut DioramaCore) -> RenderFrame<'_> {
    let effects = core.effects.drain();
    let core = &*core;
    let bodies = if core.settings.debug {
        core.world
            .bodies()
            .iter()
            .map(|b| DebugBody {
                id: b.id,
                label: &b.label,
                position: b.position,
                angle: b.angle,
                shape: &b.shape,
                is_static: b.is_static,
                is_sensor: b.is_sensor,
            })
            .collect()
    } else {
        Vec::new()
    };

    RenderFrame {
        frame: core.frame,
        time_ms: core.clock_ms,
        visuals: core.scene.draw_order(),
        effects,
        fault_level: core.features.computer.fault_level(),
        bodies,
    }
}

pub(super) fn extract_frame_json(core: &mut DioramaCore) -> DioramaResult<String> {
    Ok(serde_json::to_string(&extract_frame(core))?)
}
