//! Thumbnail error types.

use std::time::Duration;

use thiserror::Error;

use crate::storage::StorageError;

/// Thumbnail cache errors.
///
/// Everything except [`ThumbnailError::UnsupportedMedia`] is recoverable by
/// serving the original payload.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// Source payload is not an image.
    #[error("cannot preview content of type '{mime_type}'")]
    UnsupportedMedia {
        /// Sniffed MIME type of the source.
        mime_type: String,
    },

    /// Decoding, resizing or encoding failed.
    #[error("thumbnail derivation failed: {0}")]
    Derivation(String),

    /// Derivation did not finish in time.
    #[error("thumbnail derivation timed out after {0:?}")]
    TimedOut(Duration),

    /// Reading the source or writing the artifact failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ThumbnailError {
    /// Create a derivation error.
    #[must_use]
    pub fn derivation(msg: impl Into<String>) -> Self {
        Self::Derivation(msg.into())
    }
}

impl From<image::ImageError> for ThumbnailError {
    fn from(err: image::ImageError) -> Self {
        Self::Derivation(err.to_string())
    }
}

impl From<fast_image_resize::ResizeError> for ThumbnailError {
    fn from(err: fast_image_resize::ResizeError) -> Self {
        Self::Derivation(err.to_string())
    }
}
