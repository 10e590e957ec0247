//! Application configuration management.
//!
//! Values are layered, later sources winning:
//! 1. built-in defaults (every key has one)
//! 2. `config/default.toml`
//! 3. `config/{RUN_MODE}.toml`
//! 4. `FILEDROP__SECTION__KEY` environment variables

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Payload, thumbnail and metadata locations.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Thumbnail derivation settings.
    #[serde(default)]
    pub thumbnail: ThumbnailSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory of static assets served as the router fallback.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
        }
    }
}

impl ServerConfig {
    /// Socket address string in `host:port` form.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Storage layout configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory holding uploaded payloads, one file per storage key.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// Directory holding derived thumbnails.
    #[serde(default = "default_thumbnails_dir")]
    pub thumbnails_dir: PathBuf,
    /// Path of the JSON metadata document.
    #[serde(default = "default_metadata_file")]
    pub metadata_file: PathBuf,
    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_thumbnails_dir() -> PathBuf {
    PathBuf::from("thumbnails")
}

fn default_metadata_file() -> PathBuf {
    PathBuf::from("data/files.json")
}

fn default_max_upload_bytes() -> u64 {
    100 * 1024 * 1024 // 100 MiB
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            thumbnails_dir: default_thumbnails_dir(),
            metadata_file: default_metadata_file(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Thumbnail derivation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailSettings {
    /// Thumbnail width in pixels.
    #[serde(default = "default_thumbnail_width")]
    pub width: u32,
    /// Thumbnail height in pixels.
    #[serde(default = "default_thumbnail_height")]
    pub height: u32,
    /// Upper bound on a single derivation, in seconds.
    #[serde(default = "default_thumbnail_timeout")]
    pub timeout_secs: u64,
}

fn default_thumbnail_width() -> u32 {
    300
}

fn default_thumbnail_height() -> u32 {
    225
}

fn default_thumbnail_timeout() -> u64 {
    10
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            width: default_thumbnail_width(),
            height: default_thumbnail_height(),
            timeout_secs: default_thumbnail_timeout(),
        }
    }
}

impl ThumbnailSettings {
    /// Derivation timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = ::config::Config::builder()
            .add_source(::config::File::with_name("config/default").required(false))
            .add_source(::config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(::config::Environment::with_prefix("FILEDROP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
