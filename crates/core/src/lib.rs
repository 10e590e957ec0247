//! Core file-store logic for Filedrop.
//!
//! This crate contains the consistency engine with ZERO web dependencies and
//! no concrete metadata backend. Metadata persistence is a trait
//! ([`files::MetadataStore`]) implemented by the db crate.
//!
//! # Modules
//!
//! - `naming` - Display-name collision resolution
//! - `storage` - Payload and thumbnail blob storage (OpenDAL)
//! - `media` - MIME sniffing from content bytes
//! - `thumbnail` - Lazily derived, center-cropped previews
//! - `files` - Upload/delete orchestration and the metadata store seam

pub mod files;
pub mod media;
pub mod naming;
pub mod storage;
pub mod thumbnail;
