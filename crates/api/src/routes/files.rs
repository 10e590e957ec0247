//! File management routes.

use std::borrow::Cow;

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use filedrop_core::files::{FileRecord, StorageKey};
use filedrop_shared::AppError;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Header telling the client whether it got a thumbnail or the original.
pub const PREVIEW_SOURCE_HEADER: &str = "x-preview-source";

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/files", get(list_files).post(upload_file))
        .route("/files/{storage_key}", get(describe_file).delete(delete_file))
        .route("/files/{storage_key}/thumbnail", get(thumbnail))
        .route("/files/{storage_key}/download", get(download_file))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Storage key of the new file.
    pub storage_key: String,
    /// Final display name, possibly suffixed.
    pub display_name: String,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Sniffed MIME type.
    pub mime_type: String,
    /// Eager thumbnail outcome: `done`, `skipped` or `failed`.
    pub thumbnail: &'static str,
}

/// One file in a listing.
#[derive(Debug, Serialize)]
pub struct FileSummary {
    /// Record ID.
    pub id: Uuid,
    /// Display name.
    pub display_name: String,
    /// Storage key.
    pub storage_key: String,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Sniffed MIME type.
    pub mime_type: String,
    /// Upload time (RFC 3339).
    pub uploaded_at: String,
}

impl From<&FileRecord> for FileSummary {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id,
            display_name: record.display_name.clone(),
            storage_key: record.storage_key.to_string(),
            size_bytes: record.size_bytes,
            mime_type: record.mime_type.clone(),
            uploaded_at: record.uploaded_at.to_rfc3339(),
        }
    }
}

/// Full description of one file.
#[derive(Debug, Serialize)]
pub struct FileDetails {
    /// Listing fields.
    #[serde(flatten)]
    pub summary: FileSummary,
    /// Last metadata change (RFC 3339).
    pub modified_at: String,
}

/// Response for a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Display name of the deleted file.
    pub display_name: String,
    /// Human-readable confirmation.
    pub message: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Validates a storage key taken from the path.
fn parse_key(raw: &str) -> Result<StorageKey, ApiError> {
    Ok(StorageKey::parse(raw)?)
}

/// Undoes client-side percent-encoding of a multipart filename.
///
/// Names that do not decode to valid UTF-8 are kept as sent.
fn decode_client_filename(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned)
}

/// Build a Content-Disposition header with RFC 5987 encoding for non-ASCII
/// names.
fn content_disposition_header(filename: &str) -> String {
    // ASCII fallback for the plain filename parameter
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{filename}\"");
    }

    let encoded = urlencoding::encode(filename);
    format!("attachment; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

fn multipart_error(err: &MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text()).into()
    } else {
        warn!(error = %err, "failed to read multipart body");
        ApiError::validation("invalid multipart data")
    }
}

fn binary_response(
    content_type: &str,
    bytes: Bytes,
    extra: Option<(HeaderName, String)>,
) -> Result<Response, ApiError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len());
    if let Some((name, value)) = extra {
        builder = builder.header(name, value);
    }

    builder.body(Body::from(bytes)).map_err(|e| {
        error!(error = %e, "failed to build response");
        ApiError::from(AppError::Internal("failed to build response".to_string()))
    })
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/files`
/// Upload one file from the multipart field `file`. Parts after the first
/// `file` part are not read.
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field
            .file_name()
            .map(decode_client_filename)
            .ok_or_else(|| ApiError::validation("file part has no filename"))?;
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
        debug!(filename = %name, size = bytes.len(), "received file part");
        upload = Some((name, bytes));
        break;
    }

    let (name, bytes) =
        upload.ok_or_else(|| ApiError::validation(format!("missing multipart field '{FILE_FIELD}'")))?;

    let receipt = state.files.upload(&name, bytes).await?;
    let record = receipt.record;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            storage_key: record.storage_key.to_string(),
            display_name: record.display_name,
            size_bytes: record.size_bytes,
            mime_type: record.mime_type,
            thumbnail: receipt.thumbnail.label(),
        }),
    ))
}

/// GET `/files`
/// List active files, newest first.
async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileSummary>>, ApiError> {
    let records = state.files.list().await?;
    Ok(Json(records.iter().map(FileSummary::from).collect()))
}

/// GET `/files/{storage_key}`
/// Describe one file.
async fn describe_file(
    State(state): State<AppState>,
    Path(storage_key): Path<String>,
) -> Result<Json<FileDetails>, ApiError> {
    let key = parse_key(&storage_key)?;
    let record = state.files.describe(&key).await?;

    Ok(Json(FileDetails {
        summary: FileSummary::from(&record),
        modified_at: record.modified_at.to_rfc3339(),
    }))
}

/// GET `/files/{storage_key}/thumbnail`
/// Preview image; the original payload when no thumbnail can be made.
async fn thumbnail(
    State(state): State<AppState>,
    Path(storage_key): Path<String>,
) -> Result<Response, ApiError> {
    let key = parse_key(&storage_key)?;
    let preview = state.files.thumbnail(&key).await?;

    binary_response(
        &preview.content_type,
        preview.bytes,
        Some((
            HeaderName::from_static(PREVIEW_SOURCE_HEADER),
            preview.source.as_str().to_string(),
        )),
    )
}

/// GET `/files/{storage_key}/download`
/// Payload bytes as an attachment under the display name.
async fn download_file(
    State(state): State<AppState>,
    Path(storage_key): Path<String>,
) -> Result<Response, ApiError> {
    let key = parse_key(&storage_key)?;
    let download = state.files.download(&key).await?;

    binary_response(
        &download.record.mime_type,
        download.bytes,
        Some((
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.record.display_name),
        )),
    )
}

/// DELETE `/files/{storage_key}`
/// Delete a file with its thumbnail and record.
async fn delete_file(
    State(state): State<AppState>,
    Path(storage_key): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let key = parse_key(&storage_key)?;
    let receipt = state.files.delete(&key).await?;

    info!(storage_key = %key, thumbnail = receipt.thumbnail.label(), "delete request served");
    Ok(Json(DeleteResponse {
        message: format!("'{}' deleted", receipt.display_name),
        display_name: receipt.display_name,
    }))
}
