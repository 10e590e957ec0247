//! Lazily populated thumbnail cache.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::deriver::{ImageDeriver, ThumbnailDeriver};
use super::error::ThumbnailError;
use crate::media::{is_image, sniff_mime};
use crate::storage::StorageService;

/// Default thumbnail width in pixels.
pub const DEFAULT_WIDTH: u32 = 300;

/// Default thumbnail height in pixels.
pub const DEFAULT_HEIGHT: u32 = 225;

/// Default time allowed for one derivation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Thumbnail geometry and limits.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Upper bound on one derivation.
    pub timeout: Duration,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Thumbnail cache keyed by payload storage key.
///
/// Artifacts are derived on first access and reused without any staleness
/// check; payloads are immutable once uploaded. The cache never evicts on
/// its own. Whoever deletes a payload must call [`ThumbnailCache::remove`].
pub struct ThumbnailCache<D: ThumbnailDeriver = ImageDeriver> {
    store: StorageService,
    deriver: Arc<D>,
    config: ThumbnailConfig,
    generating: DashMap<String, Arc<Mutex<()>>>,
}

impl ThumbnailCache<ImageDeriver> {
    /// Create a cache using the default image deriver.
    #[must_use]
    pub fn new(store: StorageService, config: ThumbnailConfig) -> Self {
        Self::with_deriver(store, ImageDeriver, config)
    }
}

impl<D: ThumbnailDeriver> ThumbnailCache<D> {
    /// Create a cache with a custom deriver.
    #[must_use]
    pub fn with_deriver(store: StorageService, deriver: D, config: ThumbnailConfig) -> Self {
        Self {
            store,
            deriver: Arc::new(deriver),
            config,
            generating: DashMap::new(),
        }
    }

    /// Location of the artifact for `storage_key` inside the thumbnail store.
    #[must_use]
    pub fn thumbnail_key(storage_key: &str) -> String {
        format!("{storage_key}.png")
    }

    /// Content type of every artifact this cache produces.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.deriver.content_type()
    }

    /// Returns the artifact location, deriving it from the payload in
    /// `payloads` if it is not cached yet.
    ///
    /// # Errors
    ///
    /// - [`ThumbnailError::UnsupportedMedia`] if the payload is not an image
    /// - any other variant if the source could not be read or derived
    pub async fn get(
        &self,
        storage_key: &str,
        payloads: &StorageService,
    ) -> Result<String, ThumbnailError> {
        let thumb_key = Self::thumbnail_key(storage_key);
        if self.is_cached(&thumb_key).await {
            return Ok(thumb_key);
        }

        let source = payloads.read(storage_key).await?;
        self.derive_and_store(storage_key, source).await
    }

    /// Like [`ThumbnailCache::get`], for a payload whose bytes are in hand.
    ///
    /// # Errors
    ///
    /// Same as [`ThumbnailCache::get`].
    pub async fn populate(&self, storage_key: &str, source: Bytes) -> Result<String, ThumbnailError> {
        let thumb_key = Self::thumbnail_key(storage_key);
        if self.is_cached(&thumb_key).await {
            return Ok(thumb_key);
        }

        self.derive_and_store(storage_key, source).await
    }

    /// Read an artifact returned by [`ThumbnailCache::get`].
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be read.
    pub async fn read(&self, thumb_key: &str) -> Result<Bytes, ThumbnailError> {
        Ok(self.store.read(thumb_key).await?)
    }

    /// Delete the artifact for `storage_key`. Absent artifacts are fine.
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses the delete.
    pub async fn remove(&self, storage_key: &str) -> Result<(), ThumbnailError> {
        self.store.delete(&Self::thumbnail_key(storage_key)).await?;
        Ok(())
    }

    async fn is_cached(&self, thumb_key: &str) -> bool {
        // An unanswerable probe means "derive again"; the overwrite is harmless.
        self.store.exists(thumb_key).await.unwrap_or(false)
    }

    async fn derive_and_store(
        &self,
        storage_key: &str,
        source: Bytes,
    ) -> Result<String, ThumbnailError> {
        let mime_type = sniff_mime(&source);
        if !is_image(mime_type) {
            return Err(ThumbnailError::UnsupportedMedia {
                mime_type: mime_type.to_string(),
            });
        }

        let thumb_key = Self::thumbnail_key(storage_key);
        let lock = self
            .generating
            .entry(storage_key.to_string())
            .or_default()
            .clone();
        let result = {
            let _guard = lock.lock().await;
            // Someone else may have finished while we waited.
            if self.is_cached(&thumb_key).await {
                debug!(storage_key, "thumbnail produced by concurrent request");
                Ok(thumb_key)
            } else {
                self.derive_into(&thumb_key, source).await.map(|()| thumb_key)
            }
        };

        drop(lock);
        self.generating
            .remove_if(storage_key, |_, lock| Arc::strong_count(lock) == 1);

        if result.is_ok() {
            info!(storage_key, mime_type, "thumbnail derived");
        }
        result
    }

    async fn derive_into(&self, thumb_key: &str, source: Bytes) -> Result<(), ThumbnailError> {
        let deriver = Arc::clone(&self.deriver);
        let (width, height) = (self.config.width, self.config.height);
        let task = tokio::task::spawn_blocking(move || deriver.derive(&source, width, height));

        let encoded = match tokio::time::timeout(self.config.timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_err)) => return Err(ThumbnailError::derivation(join_err.to_string())),
            Err(_) => return Err(ThumbnailError::TimedOut(self.config.timeout)),
        };

        self.store.write(thumb_key, Bytes::from(encoded)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
