use serde::Serialize;

use crate::core::Vec2;
use crate::domain::{DashedLineStyle, LabelStyle};
use crate::rigid_body::BodyId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VisualId(pub u32);

/// What the renderer draws for a visual
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VisualKind {
    Sprite {
        texture: String,
    },
    /// Horizontally 3-sliced image stretched to `width`
    #[serde(rename_all = "camelCase")]
    NineSlice {
        texture: String,
        width: f32,
        height: f32,
        slice_left: f32,
        slice_right: f32,
    },
    #[serde(rename_all = "camelCase")]
    RoundedRect {
        width: f32,
        height: f32,
        radius: f32,
        fill: Option<u32>,
        stroke: Option<u32>,
        line_width: f32,
    },
    /// Belt with rollers and a dashed outline that scrolls
    #[serde(rename_all = "camelCase")]
    Conveyor {
        width: f32,
        height: f32,
        rollers: u32,
        dash_length: f32,
        gap_length: f32,
        dash_offset: f32,
    },
    DashedLine(DashedLineStyle),
    Label(LabelStyle),
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        font_size: f32,
        color: u32,
        wrap_width: f32,
    },
    #[serde(rename_all = "camelCase")]
    Gauges {
        fills: Vec<f32>,
        fg_color: u32,
        animated: bool,
    },
    Handle {
        radius: f32,
    },
    /// Monitor face; colours drift toward the fault palette as `fault` grows
    #[serde(rename_all = "camelCase")]
    Screen {
        width: f32,
        height: f32,
        fault: f32,
        bg_color: u32,
        line_color: u32,
        x_color: u32,
    },
    /// Coiled cord drawn between two world points
    #[serde(rename_all = "camelCase")]
    Cord {
        from: Vec2,
        to: Vec2,
        coils: u32,
        coil_radius: f32,
        color: u32,
        line_width: f32,
    },
}

/// Keeps a visual glued to a physics body
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub body: BodyId,
    /// Body-local offset
    pub offset: Vec2,
    pub match_rotation: bool,
    pub rotation_offset: f32,
}

impl Attachment {
    pub fn new(body: BodyId, match_rotation: bool) -> Self {
        Self {
            body,
            offset: Vec2::zero(),
            match_rotation,
            rotation_offset: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_rotation_offset(mut self, rotation: f32) -> Self {
        self.rotation_offset = rotation;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visual {
    pub id: VisualId,
    #[serde(flatten)]
    pub kind: VisualKind,
    pub position: Vec2,
    pub rotation: f32,
    pub depth: i32,
    pub visible: bool,
    pub flip_x: bool,
    pub alpha: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_size: Option<Vec2>,
    #[serde(skip)]
    pub attachment: Option<Attachment>,
}

impl Visual {
    pub(crate) fn new(id: VisualId, kind: VisualKind, position: Vec2, depth: i32) -> Self {
        Self {
            id,
            kind,
            position,
            rotation: 0.0,
            depth,
            visible: true,
            flip_x: false,
            alpha: 1.0,
            display_size: None,
            attachment: None,
        }
    }

    pub fn texture(&self) -> Option<&str> {
        match &self.kind {
            VisualKind::Sprite { texture } | VisualKind::NineSlice { texture, .. } => Some(texture),
            _ => None,
        }
    }
}
