//! Shared errors and configuration for Filedrop.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy with HTTP status mapping
//! - Layered configuration management

pub mod config;
pub mod error;

pub use config::{AppConfig, ServerConfig, StorageSettings, ThumbnailSettings};
pub use error::{AppError, AppResult};
