//! Liveness and greeting endpoints.
//!
//! - GET /healthz    -> `{"status":"ok"}`
//! - GET /api/hello  -> `{"message":"Hello from Worker API"}`

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Very small liveness check. It never touches the store, so it stays green
/// even when no store is bound.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `GET /api/hello`
pub async fn hello() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HelloResponse {
            message: "Hello from Worker API",
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct HelloResponse {
    message: &'static str,
}
