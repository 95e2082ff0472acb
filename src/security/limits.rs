//! Request shape limits: content type and body size.
//!
//! The body ceiling is measured on the re-serialized JSON, so insignificant
//! whitespace in the raw bytes does not count against it.

use axum::http::header::{self, HeaderMap};

/// The only content type accepted for POST bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// `true` when the content-type header is exactly the JSON media type.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    content_type(headers) == Some(JSON_MEDIA_TYPE)
}

pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

/// `true` when a serialized body of `len` bytes is over the ceiling.
/// A body exactly at the ceiling is within limits.
pub fn exceeds_ceiling(len: usize, max_body_bytes: usize) -> bool {
    len > max_body_bytes
}
