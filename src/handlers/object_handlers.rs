//! HTTP handlers for listing, reading and writing objects.
//! Storage concerns are delegated to the bound `ObjectStore`.

use super::{QueryParams, json, parse_leading_int};
use crate::{
    errors::AppError,
    models::object::{DEFAULT_CONTENT_TYPE, ListOptions},
    services::storage_service::decode_cursor,
    state::AppState,
};
use axum::{
    body::{Body, Bytes},
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use serde::Serialize;

const DEFAULT_LIST_LIMIT: usize = 10;

#[derive(Serialize)]
struct PutResponse {
    ok: bool,
    key: String,
    etag: Option<String>,
}

/// `GET /api/r2-list?prefix=&limit=10&cursor=`
pub async fn list_objects(
    State(state): State<AppState>,
    q: QueryParams,
) -> Result<Response, AppError> {
    let store = state.store()?;

    let limit = q
        .get("limit")
        .and_then(parse_leading_int)
        .map(|n| n.max(1) as usize)
        .unwrap_or(DEFAULT_LIST_LIMIT);

    let options = ListOptions {
        prefix: q.non_empty("prefix"),
        limit,
        start_after: q.non_empty("cursor").as_deref().map(decode_cursor),
    };

    let listing = store.list(options).await?;
    Ok(json(StatusCode::OK, listing))
}

/// `GET /api/r2-get?key=` — the object's raw bytes with its stored content type.
pub async fn get_object(
    State(state): State<AppState>,
    q: QueryParams,
) -> Result<Response, AppError> {
    let store = state.store()?;
    let key = q.non_empty("key").ok_or_else(|| AppError::missing_param("key"))?;

    let object = store.get(&key).await?.ok_or(AppError::NotFound)?;
    tracing::debug!("serving {} ({} bytes)", key, object.meta.size_bytes);

    let mut response = Response::new(Body::from(object.body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&object.meta.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", object.meta.etag)) {
        headers.insert(header::ETAG, value);
    }

    Ok(response)
}

/// `PUT /api/r2-put?key=` — store the request body verbatim under `key`.
pub async fn put_object(
    State(state): State<AppState>,
    q: QueryParams,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let store = state.store()?;
    let key = q.non_empty("key").ok_or_else(|| AppError::missing_param("key"))?;
    let body = body.map_err(|rejection| AppError::body_rejected(rejection.status(), rejection))?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let meta = store.put(&key, body, content_type).await?;
    tracing::info!("stored {} ({} bytes, {})", key, meta.size_bytes, content_type);

    Ok(json(
        StatusCode::OK,
        PutResponse {
            ok: true,
            key,
            etag: Some(meta.etag),
        },
    ))
}
