//! Named collision shapes
//!
//! Sprites with irregular outlines reference a shape by name (`shapeName`)
//! instead of inlining it in every group config.

use std::collections::HashMap;

use crate::core::{ConfigError, DioramaResult};
use crate::rigid_body::Shape;

const BUILTIN_SHAPES: &str = include_str!("../../assets/shapes.json");

#[derive(Clone, Debug, Default)]
pub struct ShapeLibrary {
    shapes: HashMap<String, Shape>,
}

impl ShapeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shapes shipped with the crate
    pub fn builtin() -> DioramaResult<Self> {
        Self::from_json(BUILTIN_SHAPES)
    }

    /// Parse a `{ name: shape }` document, rejecting degenerate shapes
    pub fn from_json(json: &str) -> DioramaResult<Self> {
        let shapes: HashMap<String, Shape> = serde_json::from_str(json)?;
        for (name, shape) in &shapes {
            shape.validate().map_err(|message| ConfigError::InvalidShape {
                name: name.clone(),
                message,
            })?;
        }
        Ok(Self { shapes })
    }

    pub fn get(&self, name: &str) -> Option<&Shape> {
        self.shapes.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, shape: Shape) {
        self.shapes.insert(name.into(), shape);
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_library_parses() {
        let lib = ShapeLibrary::builtin().unwrap();
        for name in ["coffeeMachine", "Cup", "fanBase", "fanBlades", "windMachine", "Computer", "Keyboard"] {
            assert!(lib.get(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn degenerate_shape_is_rejected() {
        let err = ShapeLibrary::from_json(r#"{"flat": {"type": "rectangle", "width": 10, "height": 0}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("flat"), "{err}");
    }

    #[test]
    fn rect_alias_is_accepted() {
        let lib = ShapeLibrary::from_json(r#"{"box": {"type": "rect", "width": 4, "height": 2}}"#).unwrap();
        assert_eq!(lib.get("box"), Some(&Shape::rect(4.0, 2.0)));
    }
}
