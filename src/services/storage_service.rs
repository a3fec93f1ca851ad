//! src/services/storage_service.rs
//!
//! Object store abstraction plus the durable backend: object metadata lives in
//! SQLite and payloads on local disk sharded beneath
//! `base_path/{shard}/{shard}/{md5(key)}-{uuid}`. Keys are never used as path
//! components, so any string is a valid key.
//!
//! Every write lands in a fresh blob file and the metadata row names the blob
//! it describes, so a row and the bytes it points at always belong to the
//! same write. The blob a row stops pointing at is removed afterwards.

use crate::models::object::{ListOptions, ObjectListing, ObjectMeta, StoredObject};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::Utc;
use sqlx::{
    QueryBuilder, SqlitePool,
    FromRow,
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions},
};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
    sync::Mutex,
};
use tracing::{debug, warn};
use uuid::Uuid;

const MAX_OBJECT_KEY_LEN: usize = 1024;
pub const MAX_LIST_LIMIT: usize = 1000;
const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");
const META_COLUMNS: &str = "key, content_type, size_bytes, etag, uploaded_at";
/// Reads that lose a race with an overwrite re-read the row this many times.
const GET_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key")]
    InvalidObjectKey,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key-addressed blob storage used by the HTTP handlers.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List objects in key order, honouring prefix, limit and cursor.
    async fn list(&self, options: ListOptions) -> StorageResult<ObjectListing>;

    /// Fetch an object with its payload; `None` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>>;

    /// Write (or overwrite) an object and return its new metadata.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<ObjectMeta>;
}

/// Reject keys the store cannot address.
pub fn ensure_key_valid(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
        return Err(StorageError::InvalidObjectKey);
    }
    Ok(())
}

/// Hex MD5 of a payload, used as its etag.
pub fn compute_etag(body: &[u8]) -> String {
    format!("{:x}", md5::compute(body))
}

/// Encode the last returned key as an opaque listing cursor.
pub fn encode_cursor(key: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(key)
}

/// Decode a listing cursor; unreadable tokens are taken as a literal key.
pub fn decode_cursor(token: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| token.to_string())
}

/// SQLite + local disk backed store.
#[derive(Clone)]
pub struct DiskStore {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: SqlitePool,

    /// Base directory on disk where object payloads are stored.
    pub base_path: PathBuf,

    /// Serializes the read-old-blob / upsert pair of concurrent writes.
    write_lock: Arc<Mutex<()>>,
}

/// A metadata row plus the blob file (relative to `base_path`) it describes.
#[derive(FromRow)]
struct ObjectRow {
    #[sqlx(flatten)]
    meta: ObjectMeta,
    blob: String,
}

impl DiskStore {
    /// Open (creating if needed) the metadata database and payload directory.
    pub async fn connect(database_url: &str, base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::with_pool(db, base_path).await
    }

    /// Build a store over an existing pool, applying the schema idempotently.
    pub async fn with_pool(db: SqlitePool, base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;

        for stmt in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            debug!("Executing schema SQL: {}", stmt);
            sqlx::query(stmt).execute(&db).await?;
        }

        Ok(Self {
            db,
            base_path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Name of a fresh blob for one write of `key`, relative to `base_path`.
    ///
    /// The first two bytes of the key's MD5 pick the shard directories; the
    /// file name is the full MD5 plus a per-write UUID.
    fn new_blob_name(key: &str) -> String {
        let digest = md5::compute(key.as_bytes());
        format!(
            "{:02x}/{:02x}/{:x}-{}",
            digest[0],
            digest[1],
            digest,
            Uuid::new_v4().simple()
        )
    }

    fn blob_path(&self, blob: &str) -> PathBuf {
        self.base_path.join(blob)
    }

    async fn remove_blob(&self, blob: &str) {
        match fs::remove_file(self.blob_path(blob)).await {
            Ok(()) => debug!("removed replaced blob {}", blob),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("could not remove blob {}: {}", blob, err),
        }
    }

    async fn fetch_row(&self, key: &str) -> StorageResult<Option<ObjectRow>> {
        let row = sqlx::query_as::<_, ObjectRow>(&format!(
            "SELECT {}, blob FROM objects WHERE key = ?",
            META_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    /// Point `key` at `blob` and return the new metadata with the blob the
    /// row referenced before, if any.
    async fn swap_row(
        &self,
        key: &str,
        blob: &str,
        body: &[u8],
        content_type: &str,
    ) -> StorageResult<(ObjectMeta, Option<String>)> {
        let _guard = self.write_lock.lock().await;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT blob FROM objects WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.db)
                .await?;

        let meta = sqlx::query_as::<_, ObjectMeta>(&format!(
            r#"
            INSERT INTO objects (key, content_type, size_bytes, etag, uploaded_at, blob)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                uploaded_at = excluded.uploaded_at,
                blob = excluded.blob
            RETURNING {}
            "#,
            META_COLUMNS
        ))
        .bind(key)
        .bind(content_type)
        .bind(body.len() as i64)
        .bind(compute_etag(body))
        .bind(Utc::now())
        .bind(blob)
        .fetch_one(&self.db)
        .await?;

        Ok((meta, previous))
    }

    /// Write bytes to a temp file beside `file_path`, fsync, then rename into place.
    async fn write_payload(&self, file_path: &Path, body: &[u8]) -> StorageResult<()> {
        let parent = file_path.parent().ok_or_else(|| {
            StorageError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));

        let written = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(body).await?;
            file.flush().await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, file_path).await
        }
        .await;

        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for DiskStore {
    async fn list(&self, options: ListOptions) -> StorageResult<ObjectListing> {
        let limit = options.limit.clamp(1, MAX_LIST_LIMIT);
        let fetch_limit = limit + 1;

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM objects WHERE 1 = 1",
            META_COLUMNS
        ));

        if let Some(prefix) = options.prefix.as_deref().filter(|p| !p.is_empty()) {
            builder.push(" AND substr(key, 1, ");
            builder.push_bind(prefix.chars().count() as i64);
            builder.push(") = ");
            builder.push_bind(prefix.to_string());
        }

        if let Some(start_after) = &options.start_after {
            builder.push(" AND key > ");
            builder.push_bind(start_after.clone());
        }

        builder.push(" ORDER BY key ASC LIMIT ");
        builder.push_bind(fetch_limit as i64);

        let mut rows: Vec<ObjectMeta> = builder.build_query_as().fetch_all(&self.db).await?;

        let truncated = rows.len() == fetch_limit;
        if truncated {
            rows.pop();
        }
        let cursor = truncated
            .then(|| rows.last().map(|last| encode_cursor(&last.key)))
            .flatten();

        Ok(ObjectListing {
            objects: rows,
            truncated,
            cursor,
        })
    }

    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        ensure_key_valid(key)?;

        for _ in 0..GET_ATTEMPTS {
            let Some(row) = self.fetch_row(key).await? else {
                return Ok(None);
            };

            match fs::read(self.blob_path(&row.blob)).await {
                Ok(body) => {
                    return Ok(Some(StoredObject {
                        meta: row.meta,
                        body: Bytes::from(body),
                    }));
                }
                // Replaced between reading the row and opening its blob.
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!("blob {} for key {} is gone, re-reading", row.blob, key);
                }
                Err(err) => return Err(StorageError::Io(err)),
            }
        }

        debug!("payload missing for key {}", key);
        Ok(None)
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<ObjectMeta> {
        ensure_key_valid(key)?;
        let blob = Self::new_blob_name(key);
        self.write_payload(&self.blob_path(&blob), &body).await?;

        let (meta, previous) = match self.swap_row(key, &blob, &body, content_type).await {
            Ok(swapped) => swapped,
            Err(err) => {
                self.remove_blob(&blob).await;
                return Err(err);
            }
        };
        if let Some(previous) = previous {
            self.remove_blob(&previous).await;
        }

        debug!("stored {} ({} bytes, etag {})", key, meta.size_bytes, meta.etag);
        Ok(meta)
    }
}
