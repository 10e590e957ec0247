//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Error-to-response mapping
//! - Application state wiring from configuration

pub mod error;
pub mod routes;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use filedrop_core::files::{FileError, FileService};
use filedrop_core::storage::{StorageConfig, StorageProvider, StorageService};
use filedrop_core::thumbnail::{ThumbnailCache, ThumbnailConfig};
use filedrop_db::JsonMetadataStore;
use filedrop_shared::{AppConfig, AppResult};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Room for multipart boundaries and part headers on top of the payload.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// File store orchestrator.
    pub files: Arc<FileService<JsonMetadataStore>>,
}

impl AppState {
    /// Opens the stores named in `config` and wires the file service.
    ///
    /// Missing directories and an absent metadata document are created.
    ///
    /// # Errors
    ///
    /// Returns an error if a store cannot be opened or the metadata document
    /// is corrupt.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let storage = &config.storage;

        let payloads = StorageService::from_config(
            StorageConfig::new(StorageProvider::local_fs(&storage.uploads_dir))
                .with_max_file_size(storage.max_upload_bytes),
        )
        .map_err(FileError::from)?;
        let thumbnails = StorageService::from_config(StorageConfig::new(
            StorageProvider::local_fs(&storage.thumbnails_dir),
        ))
        .map_err(FileError::from)?;
        let metadata = JsonMetadataStore::open(&storage.metadata_file).await?;

        info!(
            provider = payloads.provider_name(),
            uploads = %payloads.location(),
            thumbnails = %thumbnails.location(),
            metadata = %metadata.path().display(),
            "file stores ready"
        );

        let cache = ThumbnailCache::new(
            thumbnails,
            ThumbnailConfig {
                width: config.thumbnail.width,
                height: config.thumbnail.height,
                timeout: config.thumbnail.timeout(),
            },
        );

        Ok(Self {
            files: Arc::new(FileService::new(Arc::new(metadata), payloads, cache)),
        })
    }
}

/// Creates the main application router.
///
/// When `public_dir` names an existing directory its contents are served for
/// every path the API does not claim.
pub fn create_router(state: AppState, public_dir: Option<&Path>) -> Router {
    let body_limit = state
        .files
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let mut router = Router::new().nest("/api/v1", routes::api_routes());

    if let Some(dir) = public_dir.filter(|dir| dir.is_dir()) {
        info!(public_dir = %dir.display(), "serving static assets");
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
