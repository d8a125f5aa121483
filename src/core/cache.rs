//! Read-through object cache
//!
//! Snapshots are immutable once written, so an object body read once can be
//! served again without a round-trip. Keys are full object keys, which
//! already encode `(kb, snapshot, path)`. Listings and misses pass through
//! uncached.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::object_store::{ListPage, ObjectStore};
use crate::error::StoreResult;

/// Wraps any [`ObjectStore`] with a bounded body cache.
pub struct CachedObjectStore<S> {
    inner: S,
    /// Insertion-ordered; the front entry is evicted first.
    entries: RwLock<IndexMap<String, Vec<u8>>>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl<S: ObjectStore> CachedObjectStore<S> {
    pub fn new(inner: S, max_entries: usize) -> Self {
        Self {
            inner,
            entries: RwLock::new(IndexMap::new()),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().await.len(),
            max_entries: self.max_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for CachedObjectStore<S> {
    async fn list_page(&self, prefix: &str, continuation: Option<&str>) -> StoreResult<ListPage> {
        self.inner.list_page(prefix, continuation).await
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        if let Some(body) = self.entries.read().await.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(body.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let body = self.inner.get(key).await?;

        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            while entries.len() >= self.max_entries {
                if let Some((evicted, _)) = entries.shift_remove_index(0) {
                    debug!(key = %evicted, "evicted cached object");
                } else {
                    break;
                }
            }
            entries.insert(key.to_string(), body.clone());
        }
        Ok(body)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
