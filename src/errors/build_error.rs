//! Error types raised while assembling or training a network.

use thiserror::Error;

/// Errors raised while translating a configuration into a model.
///
/// Assembly is all-or-nothing: no partial model is returned on failure, and
/// retrying with identical inputs cannot succeed — the configuration has to
/// be fixed by the caller.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Unsupported feature tensor rank {rank}: expected 2, 3 or 4")]
    UnsupportedRank { rank: usize },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Invalid layer geometry: {message}")]
    Geometry { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BuildError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        BuildError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn geometry(message: impl Into<String>) -> Self {
        BuildError::Geometry {
            message: message.into(),
        }
    }
}
