//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Local filesystem directory.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Process-local memory, discarded on drop. Intended for tests.
    Memory,
}

impl StorageProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Create in-memory provider.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory
    }

    /// Get the provider name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }

    /// Human-readable location of the store root.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::LocalFs { root } => root.display().to_string(),
            Self::Memory => "memory".to_string(),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
}

impl StorageConfig {
    /// Default max file size: 100MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }
}
