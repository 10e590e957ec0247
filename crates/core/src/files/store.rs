//! Metadata persistence seam.

use std::future::Future;

use tracing::warn;

use super::error::FileError;
use super::key::StorageKey;
use super::types::{FileRecord, NewFileRecord};
use crate::storage::StorageService;

/// Durable mapping from storage key to [`FileRecord`].
///
/// Implemented by the db crate. Implementations serialize mutations so that
/// display-name resolution in [`MetadataStore::create`] always sees every
/// previously created record.
pub trait MetadataStore: Send + Sync {
    /// All records, newest first.
    fn load_all(&self) -> impl Future<Output = Result<Vec<FileRecord>, FileError>> + Send;

    /// Resolve the display name against active records, assign id and
    /// timestamps, persist and return the new record.
    fn create(
        &self,
        input: NewFileRecord,
    ) -> impl Future<Output = Result<FileRecord, FileError>> + Send;

    /// Remove the record for `storage_key`. Returns `false`, without
    /// writing, when there is none.
    fn remove(
        &self,
        storage_key: &StorageKey,
    ) -> impl Future<Output = Result<bool, FileError>> + Send;

    /// Look up one record.
    fn find_by_storage_key(
        &self,
        storage_key: &StorageKey,
    ) -> impl Future<Output = Result<Option<FileRecord>, FileError>> + Send;

    /// Drop records whose payload `probe` reports missing, persist if
    /// anything was dropped, and return the kept records newest first.
    fn reconcile<P: PayloadProbe>(
        &self,
        probe: &P,
    ) -> impl Future<Output = Result<Vec<FileRecord>, FileError>> + Send;
}

/// Answers whether a payload still exists.
pub trait PayloadProbe: Send + Sync {
    /// `false` only when the payload is positively known to be gone.
    fn is_present(&self, storage_key: &StorageKey) -> impl Future<Output = bool> + Send;
}

impl PayloadProbe for StorageService {
    async fn is_present(&self, storage_key: &StorageKey) -> bool {
        match self.exists(storage_key.as_str()).await {
            Ok(present) => present,
            Err(err) => {
                // Keep the record; a transient error must not delete metadata.
                warn!(storage_key = %storage_key, error = %err, "payload probe failed");
                true
            }
        }
    }
}
