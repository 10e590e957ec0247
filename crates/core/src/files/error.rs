//! File operation errors.

use filedrop_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// File store errors.
#[derive(Debug, Error)]
pub enum FileError {
    /// No record (or no payload) for the storage key.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Operation is not defined for this content type.
    #[error("unsupported media type: {mime_type}")]
    UnsupportedMedia {
        /// Sniffed MIME type.
        mime_type: String,
    },

    /// Metadata document could not be read or durably written.
    #[error("metadata persistence failed: {0}")]
    Persistence(String),

    /// Payload read, write or delete failed.
    #[error("payload i/o failed: {0}")]
    Io(String),

    /// Claimed display name is empty after normalization.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    /// Storage key is not filesystem-safe.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Payload exceeds the configured maximum.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    TooLarge {
        /// Payload size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },
}

impl FileError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    /// Create a persistence error.
    #[must_use]
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create an I/O error.
    #[must_use]
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create an invalid name error.
    #[must_use]
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }

    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }
}

impl From<StorageError> for FileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::FileTooLarge { size, max } => Self::TooLarge { size, max },
            StorageError::NotFound { key } => Self::NotFound(key),
            StorageError::Configuration(msg) | StorageError::Operation(msg) => Self::Io(msg),
        }
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound(key) => Self::NotFound(format!("no file with key '{key}'")),
            FileError::UnsupportedMedia { mime_type } => {
                Self::UnsupportedMedia(format!("no preview for content of type '{mime_type}'"))
            }
            FileError::Persistence(msg) => Self::Persistence(msg),
            FileError::Io(msg) => Self::Storage(msg),
            err @ (FileError::InvalidName(_) | FileError::InvalidKey(_)) => {
                Self::Validation(err.to_string())
            }
            err @ FileError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
        }
    }
}
