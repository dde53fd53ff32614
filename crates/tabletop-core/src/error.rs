//! Error types for the map data model.

use thiserror::Error;

/// Errors raised by registry mutations and the document boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The map document does not match the expected schema.
    #[error("map format error: {0}")]
    MapFormat(String),

    #[error("material id `{0}` already exists")]
    DuplicateMaterialId(String),

    #[error("unknown material id `{0}`")]
    UnknownMaterialId(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
