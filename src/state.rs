//! Shared, read-only state handed to every handler.

use crate::{errors::AppError, services::storage_service::ObjectStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Bound object store; `None` when the service runs without one.
    pub store: Option<Arc<dyn ObjectStore>>,
    /// Outbound client for `/api/exif-url`.
    pub http: reqwest::Client,
    /// Raw allow-list string, parsed again on every request.
    pub cors_allow_origins: Option<String>,
}

impl AppState {
    pub fn new(
        store: Option<Arc<dyn ObjectStore>>,
        cors_allow_origins: Option<String>,
    ) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
            cors_allow_origins,
        }
    }

    /// The configured store, or a configuration error for store-dependent routes.
    pub fn store(&self) -> Result<&Arc<dyn ObjectStore>, AppError> {
        self.store.as_ref().ok_or_else(|| {
            AppError::Config(
                "object store not configured; start with --store disk or --store memory".into(),
            )
        })
    }
}
