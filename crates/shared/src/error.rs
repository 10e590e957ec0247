//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Each variant maps to one externally visible error kind so callers can
/// tell a missing file from a storage outage without parsing messages.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced file has no record or no payload.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request body exceeds the configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Operation is not defined for this content type.
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    /// Metadata document could not be durably written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Payload read, write or delete failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::PayloadTooLarge(_) => 413,
            Self::UnsupportedMedia(_) => 415,
            Self::Persistence(_) | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedMedia(_) => "UNSUPPORTED_MEDIA",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error is the server's fault rather than the caller's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
