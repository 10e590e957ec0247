//! Metadata store implementations.

mod file;

pub use file::JsonMetadataStore;
