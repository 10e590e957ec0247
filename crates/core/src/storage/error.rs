//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// File not found in storage.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Maps an OpenDAL error raised while touching `key`.
    pub(crate) fn from_opendal(key: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(key),
            _ => Self::Operation(err.to_string()),
        }
    }
}
