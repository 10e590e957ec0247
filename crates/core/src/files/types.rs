//! File records and operation results.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::key::StorageKey;
use super::outcome::BestEffort;

/// Metadata of one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Record identifier, never reused.
    pub id: Uuid,
    /// Name shown to users; unique among active records, ignoring case.
    pub display_name: String,
    /// Where the payload lives.
    pub storage_key: StorageKey,
    /// Payload length at upload time.
    pub size_bytes: u64,
    /// MIME type sniffed from the payload.
    pub mime_type: String,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
    /// Last metadata change; equals `uploaded_at` for fresh records.
    pub modified_at: DateTime<Utc>,
}

impl FileRecord {
    /// Builds a fresh record under an already resolved display name.
    #[must_use]
    pub fn from_new(input: NewFileRecord, display_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            display_name,
            storage_key: input.storage_key,
            size_bytes: input.size_bytes,
            mime_type: input.mime_type,
            uploaded_at: now,
            modified_at: now,
        }
    }
}

/// Input for [`MetadataStore::create`](super::MetadataStore::create).
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Desired display name; the store may add a ` (N)` suffix.
    pub display_name: String,
    /// Storage key of the already placed payload.
    pub storage_key: StorageKey,
    /// Payload length.
    pub size_bytes: u64,
    /// Sniffed MIME type.
    pub mime_type: String,
}

/// Result of an upload.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// The created record, carrying the final display name.
    pub record: FileRecord,
    /// Eager thumbnail generation.
    pub thumbnail: BestEffort,
}

/// Result of a delete.
#[derive(Debug, Clone)]
pub struct DeleteReceipt {
    /// Display name of the deleted file.
    pub display_name: String,
    /// Thumbnail removal.
    pub thumbnail: BestEffort,
}

/// Where preview bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSource {
    /// The cached thumbnail artifact.
    Thumbnail,
    /// The original payload, because no thumbnail could be produced.
    Original,
}

impl PreviewSource {
    /// Label for the `X-Preview-Source` header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Original => "original",
        }
    }
}

/// Image bytes for a preview.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Encoded image.
    pub bytes: Bytes,
    /// Content type of `bytes`.
    pub content_type: String,
    /// Origin of `bytes`.
    pub source: PreviewSource,
}

/// Payload bytes and the record describing them.
#[derive(Debug, Clone)]
pub struct Download {
    /// Record of the downloaded file.
    pub record: FileRecord,
    /// Payload bytes.
    pub bytes: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileRecord {
        FileRecord::from_new(
            NewFileRecord {
                display_name: "ignored.txt".into(),
                storage_key: StorageKey::parse("1700000000000.txt").unwrap(),
                size_bytes: 12,
                mime_type: "application/octet-stream".into(),
            },
            "notes.txt".into(),
        )
    }

    #[test]
    fn test_fresh_record_timestamps_match() {
        let record = sample();
        assert_eq!(record.display_name, "notes.txt");
        assert_eq!(record.uploaded_at, record.modified_at);
    }

    #[test]
    fn test_record_uses_camel_case_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        for key in ["id", "displayName", "storageKey", "sizeBytes", "mimeType", "uploadedAt", "modifiedAt"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["storageKey"], "1700000000000.txt");
    }

    #[test]
    fn test_ids_are_distinct() {
        assert_ne!(sample().id, sample().id);
    }
}
