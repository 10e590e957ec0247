//! Content-type sniffing.
//!
//! MIME types are always derived from payload bytes. Client-supplied
//! content types and file extensions are untrusted and never consulted.

/// Fallback for payloads with no recognizable signature.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Sniffs the MIME type from the leading bytes of a payload.
#[must_use]
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    infer::get(bytes).map_or(OCTET_STREAM, |kind| kind.mime_type())
}

/// Whether a MIME type belongs to the image family.
#[must_use]
pub fn is_image(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}
