//! Storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Blob storage rooted at one directory (or one in-memory namespace).
#[derive(Clone)]
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// A local root is created when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::LocalFs { root } => {
                std::fs::create_dir_all(root).map_err(|e| {
                    StorageError::configuration(format!("cannot create {}: {e}", root.display()))
                })?;
                let root = std::fs::canonicalize(root)
                    .map_err(|e| StorageError::configuration(e.to_string()))?;
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Validate a payload size against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the size exceeds the configured maximum.
    pub fn validate_size(&self, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }
        Ok(())
    }

    /// Write a blob, replacing any previous content under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.operator
            .write(key, data)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        Ok(())
    }

    /// Read a whole blob.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the blob does not exist.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let buffer = self
            .operator
            .read(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        Ok(buffer.to_bytes())
    }

    /// Delete a blob. Deleting an absent blob succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))
    }

    /// Check if a blob exists.
    ///
    /// `Ok(false)` means the backend positively reported the blob missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not answer.
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::operation(e.to_string())),
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the store location for logs.
    #[must_use]
    pub fn location(&self) -> String {
        self.config.provider.location()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
