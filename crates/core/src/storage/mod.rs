//! Blob storage for payloads and thumbnails using Apache OpenDAL.
//!
//! The same [`StorageService`] type backs both the payload directory and the
//! thumbnail directory; each instance owns one root.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write("key", data)      │ op.stat("key")                     │
//! │ op.read("key")             │ op.delete("key")                   │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                               │
//!        services::Fs                 services::Memory
//!     (uploads/, thumbnails/)             (tests)
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::StorageService;
