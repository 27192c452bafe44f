//! Error types for the board model.

use thiserror::Error;

/// Why an image could not be placed on the board.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("image data is empty")]
    Empty,
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("unsupported image format: {0:?}")]
    Unsupported(image::ImageFormat),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero width or height")]
    ZeroSize,
}

/// Errors loading a [`crate::config::BoardConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
