//! EXIF inspection endpoints.
//!
//! - GET /api/exif?key=&debug=      parse an object already in the store
//! - GET /api/exif-url?url=&debug=  fetch an external image and parse it

use super::{QueryParams, json};
use crate::{
    errors::AppError,
    models::exif::ExifResult,
    services::exif_service::{debug_requested, safe_parse_exif},
    state::AppState,
};
use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
};
use serde::Serialize;

#[derive(Serialize)]
struct ExifKeyResponse {
    ok: bool,
    key: String,
    exif: ExifResult,
}

#[derive(Serialize)]
struct ExifUrlResponse {
    ok: bool,
    source: String,
    exif: ExifResult,
}

/// `GET /api/exif?key=`
pub async fn exif_from_store(
    State(state): State<AppState>,
    q: QueryParams,
) -> Result<Response, AppError> {
    let store = state.store()?;
    let key = q.non_empty("key").ok_or_else(|| AppError::missing_param("key"))?;

    let object = store.get(&key).await?.ok_or(AppError::NotFound)?;
    let exif = safe_parse_exif(object.body, debug_requested(q.get("debug"))).await;

    Ok(json(
        StatusCode::OK,
        ExifKeyResponse { ok: true, key, exif },
    ))
}

/// `GET /api/exif-url?url=`
///
/// A non-2xx upstream status is reported as 502. Transport failures (bad
/// URL, refused connection) are internal errors.
pub async fn exif_from_url(
    State(state): State<AppState>,
    q: QueryParams,
) -> Result<Response, AppError> {
    let target = q.non_empty("url").ok_or_else(|| AppError::missing_param("url"))?;

    let res = state
        .http
        .get(&target)
        .send()
        .await
        .with_context(|| format!("fetching {}", target))?;

    let status = res.status();
    if !status.is_success() {
        tracing::warn!("upstream {} answered {}", target, status);
        return Err(AppError::Upstream(format!(
            "Fetch failed: {}",
            status.as_u16()
        )));
    }

    let body = res
        .bytes()
        .await
        .with_context(|| format!("reading body of {}", target))?;
    let exif = safe_parse_exif(body, debug_requested(q.get("debug"))).await;

    Ok(json(
        StatusCode::OK,
        ExifUrlResponse {
            ok: true,
            source: target,
            exif,
        },
    ))
}
