use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, str::FromStr};

/// Which object store backs the `/api/r2-*`, `/api/exif` and upload routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// SQLite metadata plus sharded payload files on local disk.
    Disk,
    /// Process-local map, lost on restart.
    Memory,
    /// No store bound; store-dependent routes fail with a configuration error.
    None,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disk" => Ok(Self::Disk),
            "memory" => Ok(Self::Memory),
            "none" => Ok(Self::None),
            other => bail!("unknown store backend `{}` (expected disk, memory or none)", other),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disk => "disk",
            Self::Memory => "memory",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub storage_dir: String,
    pub database_url: String,
    /// Raw comma-separated CORS allow-list; `None` means allow every origin.
    pub cors_allow_origins: Option<String>,
    pub max_body_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Edge API router with object storage and EXIF extraction")]
pub struct Args {
    /// Host to bind to (overrides EDGE_ROUTER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides EDGE_ROUTER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Object store backend: disk, memory or none (overrides EDGE_ROUTER_STORE)
    #[arg(long)]
    pub store: Option<StoreBackend>,

    /// Directory where object payloads are stored (overrides EDGE_ROUTER_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Metadata database URL (overrides EDGE_ROUTER_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Comma-separated CORS origins, or `*` (overrides CORS_ALLOW_ORIGINS)
    #[arg(long)]
    pub cors_allow_origins: Option<String>,

    /// Maximum accepted request body in bytes (overrides EDGE_ROUTER_MAX_BODY_BYTES)
    #[arg(long)]
    pub max_body_bytes: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse())
    }

    fn merge(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env::var("EDGE_ROUTER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("EDGE_ROUTER_PORT", 8787u16)?;
        let env_store = parse_env("EDGE_ROUTER_STORE", StoreBackend::Disk)?;
        let env_storage =
            env::var("EDGE_ROUTER_STORAGE_DIR").unwrap_or_else(|_| "./data/objects".into());
        let env_db = env::var("EDGE_ROUTER_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/objects.db".into());
        let env_cors = env::var("CORS_ALLOW_ORIGINS").ok();
        let env_body_limit = parse_env("EDGE_ROUTER_MAX_BODY_BYTES", 100 * 1024 * 1024usize)?;

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            store: args.store.unwrap_or(env_store),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            cors_allow_origins: args.cors_allow_origins.or(env_cors),
            max_body_bytes: args.max_body_bytes.unwrap_or(env_body_limit),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|err| anyhow::anyhow!("{}", err))
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
