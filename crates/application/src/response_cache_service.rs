use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use chatgate_core::{AppResult, Clock};
use chatgate_domain::{CacheEntry, CacheKey};

/// Port for memoized backend responses.
#[async_trait]
pub trait ResponseCacheRepository: Send + Sync {
    /// Returns the entry for `key` unless it was stored before `stale_before`.
    ///
    /// A stale entry is removed as part of the lookup.
    async fn get_entry(
        &self,
        key: &CacheKey,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Option<CacheEntry>>;

    /// Stores or replaces the entry for `key`.
    async fn put_entry(&self, key: CacheKey, entry: CacheEntry) -> AppResult<()>;

    /// Removes every entry stored before `cutoff`.
    async fn remove_stored_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Fresh response found.
    Hit(String),
    /// Nothing usable stored.
    Miss,
}

/// Application service for the TTL response cache.
#[derive(Clone)]
pub struct ResponseCacheService {
    repository: Arc<dyn ResponseCacheRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ResponseCacheService {
    /// Creates a cache service with the given time-to-live.
    #[must_use]
    pub fn new(
        repository: Arc<dyn ResponseCacheRepository>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            clock,
            ttl,
        }
    }

    /// Returns the configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Looks up a fresh response.
    pub async fn lookup(&self, key: &CacheKey) -> AppResult<CacheLookup> {
        let stale_before = self.clock.now() - self.ttl;
        let entry = self.repository.get_entry(key, stale_before).await?;

        Ok(entry.map_or(CacheLookup::Miss, |entry| CacheLookup::Hit(entry.response)))
    }

    /// Stores a response stamped with the current time.
    pub async fn store(&self, key: CacheKey, response: impl Into<String>) -> AppResult<()> {
        let entry = CacheEntry::new(response, self.clock.now());
        self.repository.put_entry(key, entry).await
    }

    /// Removes expired entries. Intended for periodic cleanup.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let cutoff = self.clock.now() - self.ttl;
        self.repository.remove_stored_before(cutoff).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chatgate_core::ManualClock;
    use chatgate_domain::CacheKey;
    use chrono::{Duration, Utc};

    use crate::test_support::FakeResponseCacheRepository;

    use super::{CacheLookup, ResponseCacheService};

    fn service(clock: &ManualClock) -> ResponseCacheService {
        ResponseCacheService::new(
            Arc::new(FakeResponseCacheRepository::default()),
            Arc::new(clock.clone()),
            Duration::minutes(5),
        )
    }

    #[tokio::test]
    async fn stored_response_is_served_until_ttl_elapses() {
        let clock = ManualClock::new(Utc::now());
        let service = service(&clock);
        let key = CacheKey::derive("hello", Some("m1"), Some("s1"));

        service
            .store(key.clone(), "R1")
            .await
            .unwrap_or_else(|_| panic!("test"));

        clock.advance(Duration::minutes(5));
        let hit = service
            .lookup(&key)
            .await
            .unwrap_or_else(|_| panic!("test"));
        assert_eq!(hit, CacheLookup::Hit("R1".to_owned()));

        clock.advance(Duration::seconds(1));
        let miss = service
            .lookup(&key)
            .await
            .unwrap_or_else(|_| panic!("test"));
        assert_eq!(miss, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let clock = ManualClock::new(Utc::now());
        let service = service(&clock);

        service
            .store(CacheKey::from_raw("old"), "R-old")
            .await
            .unwrap_or_else(|_| panic!("test"));
        clock.advance(Duration::minutes(6));
        service
            .store(CacheKey::from_raw("new"), "R-new")
            .await
            .unwrap_or_else(|_| panic!("test"));

        let removed = service
            .sweep_expired()
            .await
            .unwrap_or_else(|_| panic!("test"));

        assert_eq!(removed, 1);
        let hit = service
            .lookup(&CacheKey::from_raw("new"))
            .await
            .unwrap_or_else(|_| panic!("test"));
        assert_eq!(hit, CacheLookup::Hit("R-new".to_owned()));
    }
}
