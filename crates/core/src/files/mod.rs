//! File store consistency engine.
//!
//! [`FileService`] coordinates three stores:
//! - the payload store (bytes, keyed by [`StorageKey`])
//! - the [`MetadataStore`] (one [`FileRecord`] per payload)
//! - the thumbnail cache (derived previews, disposable)
//!
//! Records are created only after their payload is placed and pruned when
//! their payload disappears, so every listed file can be downloaded.

mod error;
mod key;
mod outcome;
mod service;
mod store;
mod types;


pub use error::FileError;
pub use key::{MAX_KEY_LEN, StorageKey, StorageKeyGenerator};
pub use outcome::BestEffort;
pub use service::FileService;
pub use store::{MetadataStore, PayloadProbe};
pub use types::{
    DeleteReceipt, Download, FileRecord, NewFileRecord, Preview, PreviewSource, UploadReceipt,
};
