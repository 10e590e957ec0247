//! Derived preview artifacts.
//!
//! A thumbnail is a pure function of its source payload. It holds no truth of
//! its own: deleting the artifact only costs one re-derivation on the next
//! access.

mod cache;
mod deriver;
mod error;

pub use cache::{DEFAULT_HEIGHT, DEFAULT_TIMEOUT, DEFAULT_WIDTH, ThumbnailCache, ThumbnailConfig};
pub use deriver::{ImageDeriver, ThumbnailDeriver};
pub use error::ThumbnailError;
