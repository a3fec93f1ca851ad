//! Origin allow-list enforcement.
//!
//! Preflight requests are answered here and never reach the router. For all
//! other requests the handler runs first; the origin-granting headers are
//! added afterwards only when the origin is allowed.

use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;

const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const PREFLIGHT_MAX_AGE_SECS: &str = "86400";

/// Origins permitted to read responses cross-origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    Any,
    Origins(HashSet<String>),
}

impl AllowList {
    /// Build from the raw comma-separated setting. Unset, empty or `*`
    /// allows every origin, as does any `*` entry in the list.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw {
            None | Some("") => return Self::Any,
            Some(raw) => raw.trim(),
        };
        if raw == "*" {
            return Self::Any;
        }

        let origins: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if origins.contains("*") {
            Self::Any
        } else {
            Self::Origins(origins)
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Origins(origins) => origins.contains(origin),
        }
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` when denied.
    fn grant(&self, origin: &str) -> Option<HeaderValue> {
        match self {
            Self::Any => Some(HeaderValue::from_static("*")),
            Self::Origins(_) if self.allows(origin) => HeaderValue::from_str(origin).ok(),
            Self::Origins(_) => None,
        }
    }
}

/// Axum middleware applying the allow-list to every request.
pub async fn cors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let allow_list = AllowList::parse(state.cors_allow_origins.as_deref());
    let origin = request_origin(req.headers());

    if req.method() == Method::OPTIONS {
        return preflight(&allow_list, &origin, req.headers());
    }

    let mut resp = next.run(req).await;
    if let Some(value) = allow_list.grant(&origin) {
        let headers = resp.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }
    resp
}

/// Answer an `OPTIONS` request: 204 with grants, or a bare 403.
fn preflight(allow_list: &AllowList, origin: &str, req_headers: &HeaderMap) -> Response {
    let mut resp = Response::new(Body::empty());

    let Some(value) = allow_list.grant(origin) else {
        tracing::debug!("preflight denied for origin {:?}", origin);
        *resp.status_mut() = StatusCode::FORBIDDEN;
        return resp;
    };

    *resp.status_mut() = StatusCode::NO_CONTENT;
    let requested_headers = req_headers
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let headers = resp.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested_headers);
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECS),
    );
    resp
}

/// The request's `Origin`, with a missing or unreadable header read as `""`.
fn request_origin(headers: &HeaderMap) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}
