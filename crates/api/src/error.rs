//! Error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use filedrop_core::files::FileError;
use filedrop_shared::AppError;
use serde_json::json;
use tracing::error;

/// Handler error rendered as `{"error": CODE, "message": ...}`.
///
/// Server-side failures are logged in full and reported with a generic
/// message.
#[derive(Debug)]
pub struct ApiError(AppError);

impl ApiError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self(AppError::Validation(msg.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_server_error() {
            error!(error = %self.0, code = self.0.error_code(), "request failed");
            "An internal error occurred".to_string()
        } else {
            self.0.to_string()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}
