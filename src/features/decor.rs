//! Decorations: name plates and dashed guide lines, no bodies

use crate::core::BuildError;
use crate::domain::{DashedLineConfig, ItemConfig, LabelConfig};
use crate::systems::groups::{Built, EngineContext, GroupInfo, GroupManager};
use crate::systems::scene::VisualKind;

use super::Feature;

pub struct Decor;

impl Feature for Decor {
    fn name(&self) -> &'static str {
        "decor"
    }

    fn register_builders(&self, groups: &mut GroupManager) {
        groups.add_object_builder("label", build_label);
        groups.add_object_builder("dashedLineGraphic", build_dashed_line);
    }
}

fn build_label(ctx: &mut EngineContext<'_>, _group: &GroupInfo, item: &ItemConfig) -> Result<Built, BuildError> {
    let config: LabelConfig = item.typed()?;
    let visual = ctx.scene.add(VisualKind::Label(config.label_config), item.position(), 0);
    Ok(Built::visual(visual))
}

fn build_dashed_line(ctx: &mut EngineContext<'_>, _group: &GroupInfo, item: &ItemConfig) -> Result<Built, BuildError> {
    let config: DashedLineConfig = item.typed()?;
    let visual = ctx.scene.add(VisualKind::DashedLine(config.dashed_line_config), item.position(), 0);
    Ok(Built::visual(visual))
}
