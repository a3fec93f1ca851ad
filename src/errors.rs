use crate::services::storage_service::StorageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Every failure a handler can surface.
///
/// Client-facing variants carry their own message. Configuration, storage and
/// internal failures are logged and collapsed into a generic 500 body so that
/// no internal detail reaches the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    Upstream(String),
    #[error("Payload Too Large")]
    PayloadTooLarge,
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shortcut for a 400 caused by a missing query parameter.
    pub fn missing_param(name: &str) -> Self {
        Self::BadRequest(format!("Missing query param: {}", name))
    }

    /// Map a failed request-body read. Exceeding the body limit is the
    /// caller's fault (413); anything else is an internal failure.
    pub fn body_rejected(status: StatusCode, err: impl Into<anyhow::Error>) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::Internal(err.into())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(StorageError::InvalidObjectKey) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        error_response(status, message)
    }
}

/// Build the uniform `{"error": message}` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(json!({ "error": message.into() }));
    (status, body).into_response()
}
