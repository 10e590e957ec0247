//! Upload/delete orchestration.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use super::error::FileError;
use super::key::{StorageKey, StorageKeyGenerator};
use super::outcome::BestEffort;
use super::store::MetadataStore;
use super::types::{
    DeleteReceipt, Download, FileRecord, NewFileRecord, Preview, PreviewSource, UploadReceipt,
};
use crate::media::{is_image, sniff_mime};
use crate::naming::sanitize_display_name;
use crate::storage::StorageService;
use crate::thumbnail::{ImageDeriver, ThumbnailCache, ThumbnailDeriver, ThumbnailError};

/// Attempts at finding an unused storage key before giving up.
const MAX_KEY_ATTEMPTS: usize = 32;

/// Keeps payloads, metadata records and thumbnails consistent.
///
/// Every operation either completes or leaves the three stores as they were,
/// apart from best-effort steps whose outcome is reported in the receipt.
pub struct FileService<S: MetadataStore, D: ThumbnailDeriver = ImageDeriver> {
    store: Arc<S>,
    payloads: StorageService,
    thumbnails: ThumbnailCache<D>,
    keys: StorageKeyGenerator,
}

impl<S: MetadataStore, D: ThumbnailDeriver> FileService<S, D> {
    /// Create a new file service.
    #[must_use]
    pub fn new(store: Arc<S>, payloads: StorageService, thumbnails: ThumbnailCache<D>) -> Self {
        Self {
            store,
            payloads,
            thumbnails,
            keys: StorageKeyGenerator::new(),
        }
    }

    /// Largest accepted payload.
    #[must_use]
    pub fn max_upload_bytes(&self) -> u64 {
        self.payloads.config().max_file_size
    }

    /// Store a new file.
    ///
    /// The payload is placed first and the record created last, so a record
    /// never exists without its payload. If the record cannot be persisted
    /// the payload and any thumbnail are removed again.
    ///
    /// # Errors
    ///
    /// - [`FileError::InvalidName`] if nothing usable is left of `claimed_name`
    /// - [`FileError::TooLarge`] if the payload exceeds the configured maximum
    /// - [`FileError::Io`] if the payload cannot be written
    /// - [`FileError::Persistence`] if the record cannot be persisted
    pub async fn upload(
        &self,
        claimed_name: &str,
        payload: Bytes,
    ) -> Result<UploadReceipt, FileError> {
        let display_name = sanitize_display_name(claimed_name)
            .ok_or_else(|| FileError::invalid_name(claimed_name))?;
        let size_bytes = u64::try_from(payload.len()).unwrap_or(u64::MAX);
        self.payloads.validate_size(size_bytes)?;

        let storage_key = self.allocate_key(&display_name).await?;
        self.payloads
            .write(storage_key.as_str(), payload.clone())
            .await?;

        let mime_type = sniff_mime(&payload);
        let thumbnail = if is_image(mime_type) {
            let result = self.thumbnails.populate(storage_key.as_str(), payload).await;
            if let Err(err) = &result {
                warn!(storage_key = %storage_key, error = %err, "eager thumbnail failed");
            }
            BestEffort::from_result(result)
        } else {
            BestEffort::Skipped
        };

        let input = NewFileRecord {
            display_name,
            storage_key: storage_key.clone(),
            size_bytes,
            mime_type: mime_type.to_string(),
        };

        match self.store.create(input).await {
            Ok(record) => {
                info!(
                    storage_key = %record.storage_key,
                    display_name = %record.display_name,
                    size_bytes,
                    mime_type,
                    "file uploaded"
                );
                Ok(UploadReceipt { record, thumbnail })
            }
            Err(err) => {
                error!(storage_key = %storage_key, error = %err, "record creation failed, rolling back");
                self.discard_artifacts(&storage_key).await;
                Err(err)
            }
        }
    }

    /// Delete a file with its thumbnail and record.
    ///
    /// # Errors
    ///
    /// - [`FileError::NotFound`] if there is no record
    /// - [`FileError::Io`] if the payload cannot be deleted; nothing else is
    ///   touched in that case
    /// - [`FileError::Persistence`] if the record cannot be removed
    pub async fn delete(&self, storage_key: &StorageKey) -> Result<DeleteReceipt, FileError> {
        let record = self.find(storage_key).await?;

        self.payloads.delete(storage_key.as_str()).await?;

        let result = self.thumbnails.remove(storage_key.as_str()).await;
        if let Err(err) = &result {
            warn!(storage_key = %storage_key, error = %err, "thumbnail removal failed");
        }
        let thumbnail = BestEffort::from_result(result);

        // A failure here leaves a record without payload; the next
        // reconcile prunes it.
        self.store.remove(storage_key).await?;

        info!(storage_key = %storage_key, display_name = %record.display_name, "file deleted");
        Ok(DeleteReceipt {
            display_name: record.display_name,
            thumbnail,
        })
    }

    /// Active files, newest first. Records whose payload vanished are pruned.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Persistence`] if pruning cannot be persisted.
    pub async fn list(&self) -> Result<Vec<FileRecord>, FileError> {
        self.store.reconcile(&self.payloads).await
    }

    /// Record for one file.
    ///
    /// A record whose payload is gone is pruned and reported as missing.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::NotFound`] if there is no record or no payload.
    pub async fn describe(&self, storage_key: &StorageKey) -> Result<FileRecord, FileError> {
        let record = self.find(storage_key).await?;

        if let Ok(false) = self.payloads.exists(storage_key.as_str()).await {
            warn!(storage_key = %storage_key, "pruning record with missing payload");
            if let Err(err) = self.store.remove(storage_key).await {
                warn!(storage_key = %storage_key, error = %err, "stale record prune failed");
            }
            return Err(FileError::not_found(storage_key.as_str()));
        }
        Ok(record)
    }

    /// Preview image for a file.
    ///
    /// Serves the cached thumbnail, deriving it on first access. When no
    /// thumbnail can be produced the original payload is served instead.
    ///
    /// # Errors
    ///
    /// - [`FileError::NotFound`] if there is no record or no payload
    /// - [`FileError::UnsupportedMedia`] if the file is not an image
    pub async fn thumbnail(&self, storage_key: &StorageKey) -> Result<Preview, FileError> {
        let record = self.find(storage_key).await?;
        if !is_image(&record.mime_type) {
            return Err(FileError::UnsupportedMedia {
                mime_type: record.mime_type,
            });
        }

        match self.cached_thumbnail(storage_key).await {
            Ok(bytes) => Ok(Preview {
                bytes,
                content_type: self.thumbnails.content_type().to_string(),
                source: PreviewSource::Thumbnail,
            }),
            Err(ThumbnailError::UnsupportedMedia { mime_type }) => {
                Err(FileError::UnsupportedMedia { mime_type })
            }
            Err(err) => {
                warn!(storage_key = %storage_key, error = %err, "serving original instead of thumbnail");
                let bytes = self.payloads.read(storage_key.as_str()).await?;
                Ok(Preview {
                    bytes,
                    content_type: record.mime_type,
                    source: PreviewSource::Original,
                })
            }
        }
    }

    /// Payload bytes for a file.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::NotFound`] if there is no record or no payload.
    pub async fn download(&self, storage_key: &StorageKey) -> Result<Download, FileError> {
        let record = self.find(storage_key).await?;
        let bytes = self.payloads.read(storage_key.as_str()).await?;
        debug!(storage_key = %storage_key, size = bytes.len(), "serving download");
        Ok(Download { record, bytes })
    }

    async fn find(&self, storage_key: &StorageKey) -> Result<FileRecord, FileError> {
        self.store
            .find_by_storage_key(storage_key)
            .await?
            .ok_or_else(|| FileError::not_found(storage_key.as_str()))
    }

    async fn cached_thumbnail(&self, storage_key: &StorageKey) -> Result<Bytes, ThumbnailError> {
        let thumb_key = self
            .thumbnails
            .get(storage_key.as_str(), &self.payloads)
            .await?;
        self.thumbnails.read(&thumb_key).await
    }

    /// Next key with no payload behind it.
    async fn allocate_key(&self, display_name: &str) -> Result<StorageKey, FileError> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let key = self.keys.next(display_name);
            if !self.payloads.exists(key.as_str()).await? {
                return Ok(key);
            }
            warn!(storage_key = %key, "generated storage key already in use");
        }
        Err(FileError::io("no free storage key"))
    }

    async fn discard_artifacts(&self, storage_key: &StorageKey) {
        if let Err(err) = self.payloads.delete(storage_key.as_str()).await {
            error!(storage_key = %storage_key, error = %err, "orphan payload cleanup failed");
        }
        if let Err(err) = self.thumbnails.remove(storage_key.as_str()).await {
            error!(storage_key = %storage_key, error = %err, "orphan thumbnail cleanup failed");
        }
    }
}
