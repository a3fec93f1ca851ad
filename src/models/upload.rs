//! Batch-upload form entries and per-file results.

use super::exif::ExifResult;
use bytes::Bytes;
use serde::Serialize;

/// A single entry of a multipart form.
#[derive(Debug, Clone)]
pub enum FormField {
    File {
        name: String,
        file_name: Option<String>,
        content_type: Option<String>,
        data: Bytes,
    },
    Text {
        name: String,
        value: String,
    },
}

/// Result entry for one accepted file.
#[derive(Serialize, Debug, Clone)]
pub struct BatchUploadItem {
    pub key: String,
    pub size: usize,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub album: String,
    pub tags: Vec<String>,
    pub exif: ExifResult,
}

/// Response body of `POST /api/upload-batch`.
#[derive(Serialize, Debug)]
pub struct BatchUploadResponse {
    pub ok: bool,
    pub count: usize,
    pub items: Vec<BatchUploadItem>,
}
