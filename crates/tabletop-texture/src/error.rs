use std::path::PathBuf;

use thiserror::Error;

/// Failure while producing a single texture. Never escapes the engine:
/// it is logged and replaced by the grey fallback.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("invalid texture size {0}")]
    InvalidSize(u32),

    #[error("bitmap {0} not found")]
    MissingBitmap(PathBuf),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TextureError>;
