use std::fmt;

use serde_json::Value;

use crate::rigid_body::Body;
use crate::rigid_body_system::PhysicsWorld;

/// Matches one side of a collision pair
pub enum Validator {
    /// Matches every body
    Any,
    /// Matches when the body's label, or its parent's label, equals the string
    LabelEquals(String),
    Predicate(Box<dyn Fn(&Body) -> bool>),
}

impl Validator {
    pub fn label(label: impl Into<String>) -> Self {
        Validator::LabelEquals(label.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Body) -> bool + 'static,
    {
        Validator::Predicate(Box::new(f))
    }

    /// Read a validator from authoring JSON: `true` or a label string.
    /// Anything else is logged and yields a validator that never matches.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(true) => Validator::Any,
            Value::String(label) if !label.is_empty() => Validator::LabelEquals(label.clone()),
            other => {
                log::warn!("Invalid validator for collision handler: {other}");
                Validator::predicate(|_| false)
            }
        }
    }

    pub fn matches(&self, body: &Body, world: &PhysicsWorld) -> bool {
        match self {
            Validator::Any => true,
            Validator::LabelEquals(label) if label.is_empty() => {
                log::warn!("Invalid validator for collision handler: empty label");
                false
            }
            Validator::LabelEquals(label) => {
                body.label == *label
                    || body
                        .parent
                        .and_then(|p| world.body(p))
                        .map_or(false, |parent| parent.label == *label)
            }
            Validator::Predicate(f) => f(body),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Any => f.write_str("Any"),
            Validator::LabelEquals(label) => f.debug_tuple("LabelEquals").field(label).finish(),
            Validator::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Validator {
    fn from(label: &str) -> Self {
        Validator::label(label)
    }
}

impl From<bool> for Validator {
    /// `true` matches everything; `false` is not a valid validator and never matches
    fn from(any: bool) -> Self {
        if any {
            Validator::Any
        } else {
            log::warn!("Invalid validator for collision handler: false");
            Validator::predicate(|_| false)
        }
    }
}
