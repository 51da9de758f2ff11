//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum TypesError {
    /// A JSON value was expected to be an object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(String),
    /// Snapshot (de)serialization error.
    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),
}
