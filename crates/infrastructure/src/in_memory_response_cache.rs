//! In-memory response cache adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use chatgate_application::ResponseCacheRepository;
use chatgate_core::AppResult;
use chatgate_domain::{CacheEntry, CacheKey};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Process-local response cache keyed by derived cache key.
#[derive(Default)]
pub struct InMemoryResponseCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl InMemoryResponseCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResponseCacheRepository for InMemoryResponseCache {
    async fn get_entry(
        &self,
        key: &CacheKey,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Option<CacheEntry>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.cached_at >= stale_before => return Ok(Some(entry.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Re-check under the write lock: a concurrent store may have refreshed it.
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.cached_at >= stale_before => Ok(Some(entry.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put_entry(&self, key: CacheKey, entry: CacheEntry) -> AppResult<()> {
        self.entries.write().await.insert(key, entry);
        Ok(())
    }

    async fn remove_stored_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.cached_at >= cutoff);

        Ok(u64::try_from(before - entries.len()).unwrap_or(u64::MAX))
    }
}
