//! In-process object store. Contents live only as long as the process.

use super::storage_service::{
    MAX_LIST_LIMIT, ObjectStore, StorageResult, compute_etag, encode_cursor, ensure_key_valid,
};
use crate::models::object::{ListOptions, ObjectListing, ObjectMeta, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::{collections::BTreeMap, ops::Bound};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, options: ListOptions) -> StorageResult<ObjectListing> {
        let limit = options.limit.clamp(1, MAX_LIST_LIMIT);
        let prefix = options.prefix.unwrap_or_default();
        let lower = match &options.start_after {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Included(prefix.clone()),
        };

        let objects = self.objects.read().await;
        let mut matched = objects
            .range((lower, Bound::Unbounded))
            .map(|(_, object)| &object.meta)
            .skip_while(|meta| !meta.key.starts_with(&prefix) && meta.key < prefix)
            .take_while(|meta| meta.key.starts_with(&prefix))
            .cloned();

        let page: Vec<ObjectMeta> = matched.by_ref().take(limit).collect();
        let truncated = matched.next().is_some();
        let cursor = truncated
            .then(|| page.last().map(|last| encode_cursor(&last.key)))
            .flatten();

        Ok(ObjectListing {
            objects: page,
            truncated,
            cursor,
        })
    }

    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        ensure_key_valid(key)?;
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<ObjectMeta> {
        ensure_key_valid(key)?;
        let meta = ObjectMeta {
            key: key.to_string(),
            content_type: content_type.to_string(),
            size_bytes: body.len() as i64,
            etag: compute_etag(&body),
            uploaded_at: Utc::now(),
        };
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                meta: meta.clone(),
                body,
            },
        );
        Ok(meta)
    }
}
