//! `POST /api/upload-batch`: store several images at once and report their
//! EXIF metadata.
//!
//! Files are handled one at a time in submission order. The first failed
//! write aborts the request; objects written before it stay in the store.

use super::{QueryParams, json, parse_leading_int};
use crate::{
    errors::AppError,
    models::{
        object::DEFAULT_CONTENT_TYPE,
        upload::{BatchUploadItem, BatchUploadResponse, FormField},
    },
    services::exif_service::safe_parse_exif,
    state::AppState,
};
use axum::{
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

const FILES_FIELD: &str = "files";
const DEFAULT_PREFIX: &str = "uploads";
const DEFAULT_BATCH_LIMIT: i64 = 20;
const MAX_BATCH_LIMIT: i64 = 50;
const DEFAULT_FILE_NAME: &str = "image";

/// `POST /api/upload-batch?prefix=uploads&limit=20`
pub async fn upload_batch(
    State(state): State<AppState>,
    q: QueryParams,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let store = state.store()?;
    let multipart = multipart.map_err(|rejection| {
        AppError::body_rejected(
            rejection.status(),
            anyhow::Error::new(rejection).context("reading multipart form"),
        )
    })?;

    let prefix = q.non_empty("prefix").unwrap_or_else(|| DEFAULT_PREFIX.to_string());
    let limit = batch_limit(q.get("limit"));

    let fields = read_form(multipart, limit).await?;

    let album = first_text(&fields, "album").unwrap_or_default().to_string();
    let tags = split_tags(first_text(&fields, "tags").unwrap_or_default());

    let mut items = Vec::new();
    let files = fields.into_iter().filter_map(|field| match field {
        FormField::File {
            name,
            file_name,
            content_type,
            data,
        } if name == FILES_FIELD => Some((file_name, content_type, data)),
        _ => None,
    });

    for (file_name, content_type, data) in files.take(limit) {
        let key = object_key(
            &prefix,
            file_name.as_deref().filter(|n| !n.is_empty()).unwrap_or(DEFAULT_FILE_NAME),
        );
        let content_type = content_type
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        store.put(&key, data.clone(), &content_type).await?;
        tracing::debug!("batch stored {} ({} bytes)", key, data.len());

        let size = data.len();
        let exif = safe_parse_exif(data, false).await;
        if exif.is_empty() {
            tracing::debug!("no EXIF metadata in {}", key);
        }
        items.push(BatchUploadItem {
            key,
            size,
            content_type,
            album: album.clone(),
            tags: tags.clone(),
            exif,
        });
    }

    tracing::info!("batch upload stored {} file(s) under {}", items.len(), prefix);
    Ok(json(
        StatusCode::OK,
        BatchUploadResponse {
            ok: true,
            count: items.len(),
            items,
        },
    ))
}

/// Collect form entries in order. Only the first `file_limit` file entries
/// of the `files` field are buffered; later ones are drained unread.
async fn read_form(mut multipart: Multipart, file_limit: usize) -> Result<Vec<FormField>, AppError> {
    let mut fields = Vec::new();
    let mut files_seen = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(form_error("reading multipart field"))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                if name == FILES_FIELD {
                    if files_seen >= file_limit {
                        continue;
                    }
                    files_seen += 1;
                }
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(form_error("reading uploaded file"))?;
                fields.push(FormField::File {
                    name,
                    file_name: Some(file_name),
                    content_type,
                    data,
                });
            }
            None => {
                let value = field.text().await.map_err(form_error("reading form field"))?;
                fields.push(FormField::Text { name, value });
            }
        }
    }

    Ok(fields)
}

fn form_error(what: &'static str) -> impl FnOnce(MultipartError) -> AppError {
    move |err| AppError::body_rejected(err.status(), anyhow::Error::new(err).context(what))
}

/// `limit` query value: `parseInt` semantics, default 20, clamped to [1, 50].
fn batch_limit(raw: Option<&str>) -> usize {
    raw.and_then(parse_leading_int)
        .unwrap_or(DEFAULT_BATCH_LIMIT)
        .clamp(1, MAX_BATCH_LIMIT) as usize
}

fn first_text<'a>(fields: &'a [FormField], wanted: &str) -> Option<&'a str> {
    fields.iter().find_map(|field| match field {
        FormField::Text { name, value } if name == wanted => Some(value.as_str()),
        _ => None,
    })
}

/// Comma-separated tags, trimmed, blanks dropped.
fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `{prefix}/{millis}-{6 base36 chars}-{sanitized name}`
fn object_key(prefix: &str, file_name: &str) -> String {
    format!(
        "{}/{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        random_base36(6),
        sanitize_name(file_name)
    )
}

fn random_base36(len: usize) -> String {
    const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut n = Uuid::new_v4().as_u128();
    (0..len)
        .map(|_| {
            let c = ALPHABET[(n % 36) as usize] as char;
            n /= 36;
            c
        })
        .collect()
}

/// Make a client file name safe for use inside an object key.
///
/// Backslash and control characters (`\n`, `\r`, `\t`, NUL) become `-`, then
/// every run of characters outside `[A-Za-z0-9_.-]` collapses into one `-`.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        let c = match c {
            '\\' | '\n' | '\r' | '\t' | '\0' => '-',
            other => other,
        };
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }

    out
}
