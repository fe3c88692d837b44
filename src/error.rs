//! Error taxonomy for editor operations
//!
//! Every failure is local to one operation. Callers log it and keep the
//! editor in its last good state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    /// No eligible page to capture from
    #[error("open a regular web page first (http/https)")]
    NoActiveTarget,
    /// An image payload failed to decode
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    /// The payload decoded to an empty image
    #[error("image has zero width or height")]
    EmptyImage,
    /// Export requested while no image is loaded
    #[error("no image loaded")]
    NoImage,
    #[error("failed to encode image: {0}")]
    Encode(String),
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("shared store error: {0}")]
    Store(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<png::EncodingError> for EditorError {
    fn from(err: png::EncodingError) -> Self {
        EditorError::Encode(err.to_string())
    }
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
