//! Route table for the edge API.
//!
//! ## Structure
//! - `GET  /healthz`            — liveness
//! - `GET  /api/hello`          — greeting
//! - `GET  /api/r2-list`        — list objects (prefix, limit, cursor)
//! - `GET  /api/r2-get`         — read an object's bytes (`key`)
//! - `PUT  /api/r2-put`         — write the request body as an object (`key`)
//! - `POST /api/upload-batch`   — multipart batch upload with EXIF extraction
//! - `GET  /api/exif`           — EXIF of a stored object (`key`, `debug`)
//! - `GET  /api/exif-url`       — EXIF of an external image (`url`, `debug`)
//!
//! Matching is exact on method and path. Anything else is a JSON 404, and
//! `OPTIONS` never reaches the table because the CORS layer answers it.

use crate::{
    errors::error_response,
    handlers::{
        exif_handlers::{exif_from_store, exif_from_url},
        health_handlers::{healthz, hello},
        object_handlers::{get_object, list_objects, put_object},
        upload_handlers::upload_batch,
    },
    middleware::cors::cors,
    state::AppState,
};
use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{Response, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// The bare route table, without layers or state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/hello", get(hello))
        .route("/api/r2-list", get(list_objects))
        .route("/api/r2-get", get(get_object))
        .route("/api/r2-put", put(put_object))
        .route("/api/upload-batch", post(upload_batch))
        .route("/api/exif", get(exif_from_store))
        .route("/api/exif-url", get(exif_from_url))
}

/// Build the complete application: route table, fallbacks and layers.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    with_layers(routes(), state, max_body_bytes)
}

/// Wrap a route table with the 404 fallbacks, body limit, panic handling,
/// CORS and request tracing. CORS sits outside panic handling so that error
/// responses receive origin headers too.
fn with_layers(router: Router<AppState>, state: AppState, max_body_bytes: usize) -> Router {
    router
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state.clone(), cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("handler panicked: {}", detail);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{memory_store::MemoryStore, storage_service::ObjectStore};
    use axum::{
        body::to_bytes,
        http::{Request, header},
    };
    use bytes::Bytes;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    const BOUNDARY: &str = "XBOUNDARYX";
    const BODY_LIMIT: usize = 8 * 1024 * 1024;

    fn state_with(store: Option<Arc<dyn ObjectStore>>, origins: Option<&str>) -> AppState {
        let mut state = AppState::new(store, origins.map(str::to_string));
        state.http = reqwest::Client::builder().no_proxy().build().unwrap();
        state
    }

    fn memory_app(origins: Option<&str>) -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let app = app(
            state_with(Some(store.clone() as Arc<dyn ObjectStore>), origins),
            BODY_LIMIT,
        );
        (app, store)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn with_origin(uri: &str, method: &str, origin: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(resp: Response<Body>) -> Bytes {
        to_bytes(resp.into_body(), usize::MAX).await.unwrap()
    }

    async fn body_json(resp: Response<Body>) -> Value {
        serde_json::from_slice(&body_bytes(resp).await).unwrap()
    }

    /// (field name, file name, content type, data)
    type Part<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a str);

    fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, file_name, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            let disposition = match file_name {
                Some(file) => format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, file
                ),
                None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
            };
            body.extend_from_slice(disposition.as_bytes());
            if let Some(ct) = content_type {
                body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn upstream() -> String {
        let app = Router::new()
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route("/text", get(|| async { "plain text, not an image" }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn healthz_ok_regardless_of_cors() {
        let (app, _) = memory_app(Some("https://a.com"));
        let resp = app.oneshot(get_req("/healthz")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn hello_returns_greeting() {
        let (app, _) = memory_app(None);
        let resp = app.oneshot(get_req("/api/hello")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "message": "Hello from Worker API" }));
    }

    #[tokio::test]
    async fn wildcard_grants_any_origin() {
        let (app, _) = memory_app(Some("*"));
        let resp = app
            .oneshot(with_origin("/healthz", "GET", "https://b.com"))
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(resp.headers()[header::VARY], "Origin");
    }

    #[tokio::test]
    async fn listed_origin_is_echoed_and_others_get_no_headers() {
        let (app, _) = memory_app(Some("https://a.com"));

        let resp = app
            .clone()
            .oneshot(with_origin("/healthz", "GET", "https://a.com"))
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.com");
        assert_eq!(resp.headers()[header::VARY], "Origin");

        let resp = app
            .oneshot(with_origin("/healthz", "GET", "https://b.com"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert!(resp.headers().get(header::VARY).is_none());
        assert_eq!(body_json(resp).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn preflight_allowed_and_denied() {
        let (app, _) = memory_app(Some("https://a.com"));

        let resp = app
            .clone()
            .oneshot(with_origin("/api/r2-get", "OPTIONS", "https://a.com"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let methods = resp.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap();
        assert!(methods.split(',').any(|m| m == "GET"));
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");

        let resp = app
            .oneshot(with_origin("/api/r2-get", "OPTIONS", "https://b.com"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn preflight_is_answered_for_unrouted_paths() {
        let (app, _) = memory_app(None);
        let resp = app
            .oneshot(with_origin("/nowhere", "OPTIONS", "https://x.com"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn unmatched_routes_are_json_404() {
        let (app, _) = memory_app(None);

        let resp = app.clone().oneshot(get_req("/nope")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(body_json(resp).await, json!({ "error": "Not Found" }));

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, json!({ "error": "Not Found" }));
    }

    #[tokio::test]
    async fn r2_get_validates_key_and_presence() {
        let (app, _) = memory_app(None);

        let resp = app.clone().oneshot(get_req("/api/r2-get")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await, json!({ "error": "Missing query param: key" }));

        let resp = app.clone().oneshot(get_req("/api/r2-get?key=")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.oneshot(get_req("/api/r2-get?key=absent")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await, json!({ "error": "Not Found" }));
    }

    #[tokio::test]
    async fn put_then_get_round_trips_bytes_and_type() {
        let (app, _) = memory_app(None);

        let put = Request::builder()
            .method("PUT")
            .uri("/api/r2-put?key=foo")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello bytes"))
            .unwrap();
        let resp = app.clone().oneshot(put).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["key"], "foo");
        assert!(body["etag"].is_string());

        let resp = app.oneshot(get_req("/api/r2-get?key=foo")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(body_bytes(resp).await.as_ref(), b"hello bytes");
    }

    #[tokio::test]
    async fn put_without_key_or_content_type() {
        let (app, store) = memory_app(None);

        let put = Request::builder()
            .method("PUT")
            .uri("/api/r2-put")
            .body(Body::from("x"))
            .unwrap();
        let resp = app.clone().oneshot(put).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let put = Request::builder()
            .method("PUT")
            .uri("/api/r2-put?key=blob")
            .body(Body::from("x"))
            .unwrap();
        app.oneshot(put).await.unwrap();
        let obj = store.get("blob").await.unwrap().unwrap();
        assert_eq!(obj.meta.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn repeated_query_names_use_the_first_value() {
        let (app, store) = memory_app(None);
        store.put("a", Bytes::from_static(b"from a"), "text/plain").await.unwrap();
        store.put("b", Bytes::from_static(b"from b"), "text/plain").await.unwrap();

        let resp = app
            .clone()
            .oneshot(get_req("/api/r2-get?key=a&key=b"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await.as_ref(), b"from a");

        let resp = app
            .clone()
            .oneshot(get_req("/api/r2-list?limit=1&limit=50"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["objects"].as_array().unwrap().len(), 1);
        assert_eq!(body["truncated"], true);

        let resp = app.oneshot(get_req("/api/exif?key=&key=a")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await, json!({ "error": "Missing query param: key" }));
    }

    #[tokio::test]
    async fn oversized_bodies_are_json_413_on_both_write_routes() {
        let store = Arc::new(MemoryStore::new());
        let app = app(
            state_with(Some(store.clone() as Arc<dyn ObjectStore>), Some("*")),
            16,
        );

        let put = Request::builder()
            .method("PUT")
            .uri("/api/r2-put?key=big")
            .header(header::ORIGIN, "https://a.example")
            .body(Body::from("0123456789abcdefghij"))
            .unwrap();
        let resp = app.clone().oneshot(put).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(body_json(resp).await, json!({ "error": "Payload Too Large" }));
        assert!(store.get("big").await.unwrap().is_none());

        let req = multipart_request(
            "/api/upload-batch",
            &[("files", Some("big.jpg"), Some("image/jpeg"), "far more than sixteen bytes")],
        );
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(resp).await, json!({ "error": "Payload Too Large" }));

        let put = Request::builder()
            .method("PUT")
            .uri("/api/r2-put?key=small")
            .body(Body::from("tiny"))
            .unwrap();
        assert_eq!(app.oneshot(put).await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn r2_list_applies_prefix_and_limit() {
        let (app, store) = memory_app(None);
        for key in ["img/a", "img/b", "img/c", "doc/a"] {
            store.put(key, Bytes::from_static(b"x"), "text/plain").await.unwrap();
        }

        let resp = app
            .clone()
            .oneshot(get_req("/api/r2-list?prefix=img/&limit=2"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let keys: Vec<_> = body["objects"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["key"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, ["img/a", "img/b"]);
        assert_eq!(body["truncated"], true);
        assert_eq!(body["objects"][0]["contentType"], "text/plain");
        assert_eq!(body["objects"][0]["size"], 1);

        let cursor = body["cursor"].as_str().unwrap().to_string();
        let resp = app
            .clone()
            .oneshot(get_req(&format!("/api/r2-list?prefix=img/&limit=2&cursor={}", cursor)))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["objects"].as_array().unwrap().len(), 1);
        assert_eq!(body["truncated"], false);

        let resp = app.oneshot(get_req("/api/r2-list?limit=abc")).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["objects"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn missing_store_is_generic_500_with_cors() {
        let app = app(state_with(None, None), BODY_LIMIT);
        for uri in ["/api/r2-list", "/api/r2-get?key=a", "/api/exif?key=a"] {
            let resp = app.clone().oneshot(get_req(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(body_json(resp).await, json!({ "error": "Internal Server Error" }));
        }

        let resp = app.oneshot(get_req("/healthz")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn batch_upload_honours_limit_and_skips_text_entries() {
        let (app, store) = memory_app(None);
        let req = multipart_request(
            "/api/upload-batch?prefix=trip&limit=2",
            &[
                ("album", None, None, "Summer"),
                ("files", None, None, "not a file"),
                ("files", Some("a b.jpg"), Some("image/jpeg"), "first"),
                ("files", Some("two.png"), Some("image/png"), "second!"),
                ("files", Some("three.gif"), Some("image/gif"), "third"),
                ("tags", None, None, " beach, ,sunset "),
            ],
        );

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["count"], 2);

        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        let key = first["key"].as_str().unwrap();
        assert!(key.starts_with("trip/"));
        assert!(key.ends_with("-a-b.jpg"));
        assert_eq!(first["size"], 5);
        assert_eq!(first["contentType"], "image/jpeg");
        assert_eq!(first["album"], "Summer");
        assert_eq!(first["tags"], json!(["beach", "sunset"]));
        assert_eq!(first["exif"], json!({}));

        assert!(items[1]["key"].as_str().unwrap().ends_with("-two.png"));
        assert_eq!(items[1]["size"], 7);

        let stored = store.get(key).await.unwrap().unwrap();
        assert_eq!(stored.body.as_ref(), b"first");
        assert_eq!(stored.meta.content_type, "image/jpeg");

        let listing = store
            .list(crate::models::object::ListOptions {
                prefix: Some("trip/".into()),
                limit: 10,
                start_after: None,
            })
            .await
            .unwrap();
        assert_eq!(listing.objects.len(), 2);
    }

    #[tokio::test]
    async fn batch_upload_defaults_prefix_and_type() {
        let (app, _) = memory_app(None);
        let req = multipart_request(
            "/api/upload-batch",
            &[("files", Some("scan.raw"), None, "raw")],
        );

        let resp = app.oneshot(req).await.unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["count"], 1);
        let item = &body["items"][0];
        assert!(item["key"].as_str().unwrap().starts_with("uploads/"));
        assert!(item["key"].as_str().unwrap().ends_with("-scan.raw"));
        assert_eq!(item["contentType"], "application/octet-stream");
        assert_eq!(item["album"], "");
        assert_eq!(item["tags"], json!([]));
    }

    #[tokio::test]
    async fn batch_upload_rejects_non_multipart_with_500() {
        let (app, _) = memory_app(None);
        let req = Request::builder()
            .method("POST")
            .uri("/api/upload-batch")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await, json!({ "error": "Internal Server Error" }));
    }

    #[tokio::test]
    async fn exif_on_stored_photo_reports_camera_fields() {
        let (app, store) = memory_app(None);
        store
            .put(
                "cam.jpg",
                Bytes::from_static(include_bytes!("../services/testdata/camera.jpg")),
                "image/jpeg",
            )
            .await
            .unwrap();

        let resp = app.oneshot(get_req("/api/exif?key=cam.jpg")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["key"], "cam.jpg");
        assert_eq!(body["exif"]["Make"], "Canon");
        assert_eq!(body["exif"]["ISO"], 400);
        assert_eq!(body["exif"]["raw"]["Model"], "EOS R6");
        assert!(body["exif"]["GPSLongitude"].as_f64().unwrap() < 0.0);
    }

    #[tokio::test]
    async fn exif_on_stored_non_image_is_empty() {
        let (app, store) = memory_app(None);
        store
            .put("notes.txt", Bytes::from_static(b"just words"), "text/plain")
            .await
            .unwrap();

        let resp = app.clone().oneshot(get_req("/api/exif")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.clone().oneshot(get_req("/api/exif?key=gone")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(get_req("/api/exif?key=notes.txt&debug=1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({ "ok": true, "key": "notes.txt", "exif": {} })
        );
    }

    #[tokio::test]
    async fn exif_url_maps_upstream_failures() {
        let base = upstream().await;
        let (app, _) = memory_app(None);

        let resp = app.clone().oneshot(get_req("/api/exif-url")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await, json!({ "error": "Missing query param: url" }));

        let resp = app
            .clone()
            .oneshot(get_req(&format!("/api/exif-url?url={}/missing", base)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(resp).await, json!({ "error": "Fetch failed: 404" }));

        let resp = app
            .oneshot(get_req(&format!("/api/exif-url?url={}/text&debug=1", base)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["source"], format!("{}/text", base));
        assert_eq!(body["exif"], json!({}));
    }

    #[tokio::test]
    async fn exif_url_works_without_a_store() {
        let base = upstream().await;
        let app = app(state_with(None, None), BODY_LIMIT);
        let resp = app
            .oneshot(get_req(&format!("/api/exif-url?url={}/text", base)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn panics_become_generic_500() {
        let state = state_with(None, Some("https://a.com"));
        async fn boom() -> StatusCode {
            panic!("kaboom")
        }
        let router = routes().route("/boom", get(boom));
        let app = with_layers(router, state, BODY_LIMIT);

        let resp = app
            .oneshot(with_origin("/boom", "GET", "https://a.com"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.com");
        assert_eq!(body_json(resp).await, json!({ "error": "Internal Server Error" }));
    }
}
