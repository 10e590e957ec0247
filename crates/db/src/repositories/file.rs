//! File record repository backed by a JSON document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use filedrop_core::files::{
    FileError, FileRecord, MetadataStore, NewFileRecord, PayloadProbe, StorageKey,
};
use filedrop_core::naming::resolve_display_name;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::document;

/// [`MetadataStore`] keeping every record in one pretty-printed JSON array.
///
/// The in-memory copy is the single writer's view. Each mutation builds the
/// next collection, persists it, and only then swaps it in, so memory never
/// runs ahead of the last successful write. Persist and swap run in a
/// detached task holding the lock, so a caller that stops waiting cannot
/// leave the document ahead of memory.
#[derive(Debug)]
pub struct JsonMetadataStore {
    path: PathBuf,
    records: Arc<Mutex<Vec<FileRecord>>>,
}

impl JsonMetadataStore {
    /// Open the document at `path`, creating `[]` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Persistence`] if the document cannot be created
    /// or read, or does not parse.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, FileError> {
        let path = path.into();
        let load_path = path.clone();
        let records = tokio::task::spawn_blocking(move || document::load_or_init(&load_path))
            .await
            .map_err(|e| FileError::persistence(e.to_string()))??;

        info!(path = %path.display(), records = records.len(), "metadata store opened");
        Ok(Self {
            path,
            records: Arc::new(Mutex::new(records)),
        })
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock the collection for a mutation.
    async fn lock_for_write(&self) -> OwnedMutexGuard<Vec<FileRecord>> {
        Arc::clone(&self.records).lock_owned().await
    }

    /// Persist `next` and install it as the current collection.
    ///
    /// Runs to completion even if the returned future is dropped.
    async fn commit(
        &self,
        mut guard: OwnedMutexGuard<Vec<FileRecord>>,
        next: Vec<FileRecord>,
    ) -> Result<(), FileError> {
        let path = self.path.clone();
        let task = tokio::spawn(async move {
            let bytes = document::encode(&next)?;
            tokio::task::spawn_blocking(move || document::write_atomic(&path, &bytes))
                .await
                .map_err(|e| FileError::persistence(e.to_string()))??;

            *guard = next;
            Ok::<(), FileError>(())
        });

        task.await
            .map_err(|e| FileError::persistence(e.to_string()))?
    }
}

impl MetadataStore for JsonMetadataStore {
    async fn load_all(&self) -> Result<Vec<FileRecord>, FileError> {
        Ok(self.records.lock().await.clone())
    }

    async fn create(&self, input: NewFileRecord) -> Result<FileRecord, FileError> {
        let guard = self.lock_for_write().await;

        let display_name = resolve_display_name(
            &input.display_name,
            guard.iter().map(|r| r.display_name.as_str()),
        );
        if display_name != input.display_name {
            debug!(desired = %input.display_name, resolved = %display_name, "display name taken");
        }
        let record = FileRecord::from_new(input, display_name);

        let mut next = Vec::with_capacity(guard.len() + 1);
        next.push(record.clone());
        next.extend(guard.iter().cloned());

        self.commit(guard, next).await?;
        Ok(record)
    }

    async fn remove(&self, storage_key: &StorageKey) -> Result<bool, FileError> {
        let guard = self.lock_for_write().await;
        if !guard.iter().any(|r| &r.storage_key == storage_key) {
            return Ok(false);
        }

        let next = guard
            .iter()
            .filter(|r| &r.storage_key != storage_key)
            .cloned()
            .collect();
        self.commit(guard, next).await?;
        Ok(true)
    }

    async fn find_by_storage_key(
        &self,
        storage_key: &StorageKey,
    ) -> Result<Option<FileRecord>, FileError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|r| &r.storage_key == storage_key)
            .cloned())
    }

    async fn reconcile<P: PayloadProbe>(&self, probe: &P) -> Result<Vec<FileRecord>, FileError> {
        // Probing under the lock: an upload in flight either has no record
        // yet or already has its payload.
        let guard = self.lock_for_write().await;

        let mut kept = Vec::with_capacity(guard.len());
        for record in guard.iter() {
            if probe.is_present(&record.storage_key).await {
                kept.push(record.clone());
            } else {
                warn!(
                    storage_key = %record.storage_key,
                    display_name = %record.display_name,
                    "pruning record with missing payload"
                );
            }
        }

        if kept.len() != guard.len() {
            self.commit(guard, kept.clone()).await?;
        }
        Ok(kept)
    }
}
