//! Storage keys.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::FileError;
use crate::naming::split_extension;

/// Longest accepted storage key.
pub const MAX_KEY_LEN: usize = 128;

/// Longest extension (without the dot) carried over from a claimed name.
const MAX_EXTENSION_LEN: usize = 16;

/// Filesystem-safe identifier of a stored payload.
///
/// Never derived from the display name, beyond reusing a plain
/// alphanumeric extension. Immutable for the life of the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageKey(String);

impl StorageKey {
    /// Validates an externally supplied key.
    ///
    /// Accepts `[A-Za-z0-9._-]` only, 1 to [`MAX_KEY_LEN`] characters, with no
    /// leading dot and no `..`, so a key can never escape its store root.
    pub fn parse(raw: &str) -> Result<Self, FileError> {
        let valid_chars = raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));

        if raw.is_empty()
            || raw.len() > MAX_KEY_LEN
            || !valid_chars
            || raw.starts_with('.')
            || raw.contains("..")
        {
            return Err(FileError::invalid_key(raw));
        }
        Ok(Self(raw.to_string()))
    }

    /// Key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StorageKey {
    type Error = FileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}

/// Issues `{unix_millis}{extension}` keys.
///
/// Millisecond values are strictly increasing within one generator, even
/// when several uploads land in the same millisecond or the clock steps
/// backwards.
#[derive(Debug, Default)]
pub struct StorageKeyGenerator {
    last_millis: AtomicI64,
}

impl StorageKeyGenerator {
    /// Create a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_millis: AtomicI64::new(0),
        }
    }

    /// Next key for a payload claimed as `claimed_name`.
    pub fn next(&self, claimed_name: &str) -> StorageKey {
        let millis = self.next_millis(Utc::now().timestamp_millis());
        StorageKey(format!("{millis}{}", key_extension(claimed_name)))
    }

    fn next_millis(&self, now: i64) -> i64 {
        let previous = self
            .last_millis
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }
}

/// Extension reused in the storage key, or `""` when it is not plain
/// ASCII alphanumerics.
fn key_extension(claimed_name: &str) -> &str {
    let (_, ext) = split_extension(claimed_name);
    let body = ext.strip_prefix('.').unwrap_or_default();

    if body.is_empty()
        || body.len() > MAX_EXTENSION_LEN
        || !body.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return "";
    }
    ext
}
