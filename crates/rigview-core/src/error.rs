//! Error types for rigview

use crate::id::FrameId;
use thiserror::Error;

/// The main error type for rigview operations
#[derive(Debug, Error)]
pub enum RigviewError {
    #[error("Frame not found: {0}")]
    FrameNotFound(FrameId),

    #[error("Relation not found: {from} -> {to}")]
    RelationNotFound { from: FrameId, to: FrameId },

    #[error("Relation already exists between {from} and {to}")]
    DuplicateRelation { from: FrameId, to: FrameId },

    #[error("Frame {0} cannot be related to itself")]
    SelfRelation(FrameId),

    #[error("The root frame cannot be removed")]
    RootFrame,

    #[error("Scene has been disposed")]
    SceneDisposed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

/// Result type alias for rigview operations
pub type Result<T> = std::result::Result<T, RigviewError>;

impl From<toml::de::Error> for RigviewError {
    fn from(err: toml::de::Error) -> Self {
        RigviewError::TomlParseError(err.to_string())
    }
}
