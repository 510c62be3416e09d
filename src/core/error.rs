//! Error types
//!
//! Nothing here is fatal to a running scene: configuration and builder errors
//! are logged and the offending entity is skipped, clipboard errors are logged
//! and ignored. Only loading a malformed config or settings document surfaces
//! an error to the caller.

use thiserror::Error;

pub type DioramaResult<T> = Result<T, DioramaError>;

#[derive(Debug, Error)]
pub enum DioramaError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("clipboard: {0}")]
    Clipboard(#[from] ClipboardError),
    #[error("no group with id `{0}`")]
    UnknownGroup(String),
}

/// Declarative config rejected at load time
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("item `{id}` of type `{kind}`: {message}")]
    InvalidItem {
        id: String,
        kind: String,
        message: String,
    },
    #[error("invalid shape `{name}`: {message}")]
    InvalidShape { name: String, message: String },
    #[error("settings: {0}")]
    InvalidSetting(String),
}

/// Builder failed to turn an item config into an entity
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("no sprite or shape provided for static object at ({x}, {y})")]
    MissingSpriteOrShape { x: f32, y: f32 },
    #[error("unknown shape `{0}`")]
    UnknownShape(String),
    #[error("{link} link has non-positive effective length {length}")]
    DegenerateLink { link: &'static str, length: f32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClipboardError {
    #[error("clipboard access is unavailable")]
    Unavailable,
    #[error("clipboard write rejected: {0}")]
    Rejected(String),
}
