//! Declarative group / item configuration
//!
//! A [`GroupConfig`] is the authoring format for one draggable cluster of
//! objects. Item positions are relative to the group origin. Each item carries
//! a `type` tag that selects the builder; the remaining fields are
//! type-specific and are checked against the typed records below when the
//! config is loaded.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{ConfigError, DioramaResult, Vec2};
use crate::rigid_body::Shape;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfig {
    pub id: String,
    pub origin: Vec2,
    #[serde(default)]
    pub show_handle: bool,
    #[serde(default)]
    pub objects: Vec<ItemConfig>,
}

impl GroupConfig {
    pub fn new(id: impl Into<String>, origin: Vec2) -> Self {
        Self {
            id: id.into(),
            origin,
            show_handle: false,
            objects: Vec::new(),
        }
    }

    pub fn with_handle(mut self, show: bool) -> Self {
        self.show_handle = show;
        self
    }

    pub fn with_object(mut self, item: ItemConfig) -> Self {
        self.objects.push(item);
        self
    }

    /// Parse and validate a group document
    pub fn from_json(json: &str) -> DioramaResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every built-in item against its typed record. Unknown types pass;
    /// they are skipped with a warning when the group is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for item in &self.objects {
            TypedItem::parse(item)?;
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> DioramaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<i32>,
    /// Type-specific fields, kept verbatim so authoring round-trips
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ItemConfig {
    pub fn new(kind: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            x,
            y,
            depth: None,
            params: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Copy with `x`/`y` translated into world space
    pub fn placed_at(&self, origin: Vec2) -> Self {
        Self {
            x: origin.x + self.x,
            y: origin.y + self.y,
            ..self.clone()
        }
    }

    /// Decode the type-specific fields into `T`
    pub fn typed<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_json::from_value(Value::Object(self.params.clone())).map_err(|e| ConfigError::InvalidItem {
            id: self.id.clone().unwrap_or_default(),
            kind: self.kind.clone(),
            message: e.to_string(),
        })
    }
}

/// Built-in item records keyed by their `type` tag
#[derive(Clone, Debug, PartialEq)]
pub enum TypedItem {
    Static(StaticConfig),
    Sprite(SpriteConfig),
    Paddle(PaddleConfig),
    Conveyor(ConveyorConfig),
    Book(BookConfig),
    Bugjar(BugjarConfig),
    RobotArm(RobotArmConfig),
    Label(LabelConfig),
    DashedLineGraphic(DashedLineConfig),
}

impl TypedItem {
    pub const TYPE_NAMES: [&'static str; 9] = [
        "static",
        "sprite",
        "paddle",
        "conveyor",
        "book",
        "bugjar",
        "robotArm",
        "label",
        "dashedLineGraphic",
    ];

    /// `Ok(None)` for types outside the built-in set
    pub fn parse(item: &ItemConfig) -> Result<Option<Self>, ConfigError> {
        let typed = match item.kind.as_str() {
            "static" => TypedItem::Static(item.typed()?),
            "sprite" => TypedItem::Sprite(item.typed()?),
            "paddle" => TypedItem::Paddle(item.typed()?),
            "conveyor" => TypedItem::Conveyor(item.typed()?),
            "book" => TypedItem::Book(item.typed()?),
            "bugjar" => TypedItem::Bugjar(item.typed()?),
            "robotArm" => TypedItem::RobotArm(item.typed()?),
            "label" => TypedItem::Label(item.typed()?),
            "dashedLineGraphic" => TypedItem::DashedLineGraphic(item.typed()?),
            _ => return Ok(None),
        };
        typed.check(item)?;
        Ok(Some(typed))
    }

    fn check(&self, item: &ItemConfig) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidItem {
            id: item.id.clone().unwrap_or_default(),
            kind: item.kind.clone(),
            message,
        };
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(invalid(format!("`{name}` must be positive, got {v}")))
            }
        };
        match self {
            TypedItem::Static(c) => {
                if let Some(shape) = &c.shape {
                    shape.validate().map_err(invalid)?;
                }
                Ok(())
            }
            TypedItem::Sprite(c) => {
                if let Some(shape) = c.body.as_ref().and_then(|b| b.shape.as_ref()) {
                    shape.validate().map_err(invalid)?;
                }
                Ok(())
            }
            TypedItem::Paddle(c) => {
                positive("w", c.w)?;
                positive("h", c.h)
            }
            TypedItem::Conveyor(c) => {
                positive("w", c.w)?;
                positive("h", c.h)
            }
            TypedItem::Book(c) => {
                positive("width", c.width)?;
                positive("height", c.height)
            }
            TypedItem::Bugjar(c) => {
                positive("width", c.width)?;
                positive("height", c.height)?;
                if c.max_hits == 0 {
                    return Err(invalid("`maxHits` must be at least 1".to_string()));
                }
                Ok(())
            }
            TypedItem::RobotArm(c) => {
                positive("boomLength", c.boom_length)?;
                positive("headLength", c.head_length)
            }
            TypedItem::Label(c) => {
                positive("width", c.label_config.width)?;
                positive("height", c.label_config.height)
            }
            TypedItem::DashedLineGraphic(c) => positive("lineLength", c.dashed_line_config.line_length),
        }
    }
}

/// Non-interactive collider with an optional sprite
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticConfig {
    pub sprite: Option<String>,
    pub shape_name: Option<String>,
    pub shape: Option<Shape>,
    pub label: Option<String>,
}

/// Body options of a physical sprite
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteBodyConfig {
    pub shape: Option<Shape>,
    #[serde(default)]
    pub is_static: bool,
    pub label: Option<String>,
    pub friction: Option<f32>,
    pub restitution: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteConfig {
    pub sprite: String,
    pub shape_name: Option<String>,
    #[serde(alias = "matterBodyConfig")]
    pub body: Option<SpriteBodyConfig>,
    pub display_width: Option<f32>,
    pub display_height: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddleConfig {
    pub w: f32,
    pub h: f32,
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub user_draggable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConveyorConfig {
    pub w: f32,
    pub h: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookConfig {
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_book_type")]
    pub book_type: u8,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order: u32,
}

fn default_book_type() -> u8 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BugjarConfig {
    pub width: f32,
    pub height: f32,
    pub max_hits: u32,
}

impl Default for BugjarConfig {
    fn default() -> Self {
        Self {
            width: 64.0,
            height: 80.0,
            max_hits: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RobotArmConfig {
    pub boom_length: f32,
    pub head_length: f32,
    pub pincer_length: f32,
    pub pincer_width: f32,
    pub pincer_min_dist: f32,
    pub pincer_max_dist: f32,
    /// How far back from the boom end the head attaches
    pub head_joint_offset: f32,
    /// Distance from the rear of the head to its joint
    pub head_joint_local_offset: f32,
    /// Pincer base distance in front of the head end
    pub pincer_distance_from_head: f32,
}

impl Default for RobotArmConfig {
    fn default() -> Self {
        Self {
            boom_length: 120.0,
            head_length: 55.0,
            pincer_length: 32.0,
            pincer_width: 12.0,
            pincer_min_dist: 16.0,
            pincer_max_dist: 60.0,
            head_joint_offset: 5.0,
            head_joint_local_offset: 20.0,
            pincer_distance_from_head: 18.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelConfig {
    pub label_config: LabelStyle,
}

/// Rounded plate with two screws and centred text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelStyle {
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub background_color: u32,
    pub screw_color: u32,
    pub text: String,
    pub text_color: u32,
    pub font_size: f32,
    pub font_family: String,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            width: 170.0,
            height: 28.0,
            radius: 14.0,
            background_color: 0x536a96,
            screw_color: 0x7fa6a3,
            text: "Label".to_string(),
            text_color: 0xffffff,
            font_size: 18.0,
            font_family: "Montserrat".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashedLineConfig {
    pub dashed_line_config: DashedLineStyle,
}

/// Vertical dashed line ending in a filled circle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashedLineStyle {
    pub line_length: f32,
    pub line_width: f32,
    pub dash_length: f32,
    pub gap_length: f32,
    pub line_color: u32,
    pub circle_radius: f32,
    pub circle_color: u32,
    pub alpha: f32,
}

impl Default for DashedLineStyle {
    fn default() -> Self {
        Self {
            line_length: 200.0,
            line_width: 6.0,
            dash_length: 12.0,
            gap_length: 14.0,
            line_color: 0x1e2449,
            circle_radius: 18.0,
            circle_color: 0x000000,
            alpha: 1.0,
        }
    }
}
