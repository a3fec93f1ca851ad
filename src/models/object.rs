//! Represents an object (blob) held by the object store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Content type recorded when the writer did not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Metadata for a stored object, without its payload.
#[derive(Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Caller-supplied key, used verbatim for addressing.
    pub key: String,

    /// MIME type recorded at write time.
    #[serde(rename = "contentType")]
    pub content_type: String,

    /// Payload size in bytes.
    #[serde(rename = "size")]
    pub size_bytes: i64,

    /// Hex MD5 of the payload, assigned by the store on write.
    pub etag: String,

    /// When the object was last written.
    #[serde(rename = "uploaded")]
    pub uploaded_at: DateTime<Utc>,
}

/// An object together with its payload.
#[derive(Clone, Debug)]
pub struct StoredObject {
    pub meta: ObjectMeta,
    pub body: Bytes,
}

/// Parameters for a listing call.
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub prefix: Option<String>,
    pub limit: usize,
    /// Decoded cursor: only keys strictly greater than this are returned.
    pub start_after: Option<String>,
}

/// One page of a listing.
#[derive(Serialize, Debug, Default)]
pub struct ObjectListing {
    pub objects: Vec<ObjectMeta>,
    pub truncated: bool,
    /// Opaque token to pass back as `cursor` when `truncated` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}
