use anyhow::{Context, Result};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use config::{AppConfig, StoreBackend};
use services::{memory_store::MemoryStore, storage_service::{DiskStore, ObjectStore}};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;
    tracing::info!("Starting edge-router with config: {:?}", cfg);

    // --- Bind the object store ---
    let store: Option<Arc<dyn ObjectStore>> = match cfg.store {
        StoreBackend::Disk => {
            let disk = DiskStore::connect(&cfg.database_url, &cfg.storage_dir)
                .await
                .with_context(|| {
                    format!(
                        "opening disk store (db {}, dir {})",
                        cfg.database_url, cfg.storage_dir
                    )
                })?;
            tracing::info!("Object store: disk at {}", cfg.storage_dir);
            Some(Arc::new(disk))
        }
        StoreBackend::Memory => {
            tracing::info!("Object store: in-memory");
            Some(Arc::new(MemoryStore::new()))
        }
        StoreBackend::None => {
            tracing::warn!("No object store bound; storage routes will fail");
            None
        }
    };

    // --- Build router ---
    let state = state::AppState::new(store, cfg.cors_allow_origins.clone());
    let app = routes::routes::app(state, cfg.max_body_bytes);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
