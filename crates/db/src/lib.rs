//! Metadata persistence for Filedrop.
//!
//! This crate provides:
//! - [`JsonMetadataStore`], the [`MetadataStore`](filedrop_core::files::MetadataStore)
//!   implementation backed by one JSON document
//! - atomic document replacement (temp file, fsync, rename)

mod document;
pub mod repositories;

pub use repositories::JsonMetadataStore;
