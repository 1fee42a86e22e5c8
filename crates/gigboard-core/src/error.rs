//! Core domain errors.

use thiserror::Error;

/// Core domain errors for Gigboard.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A status or role literal the backend does not define.
    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
