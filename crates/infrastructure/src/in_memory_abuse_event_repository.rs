//! Bounded in-memory abuse event log.

use std::collections::VecDeque;

use async_trait::async_trait;
use chatgate_application::AbuseEventRepository;
use chatgate_core::AppResult;
use chatgate_domain::{AbuseEvent, AbuseStats};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Default number of events retained.
pub const DEFAULT_ABUSE_LOG_CAPACITY: usize = 1_000;

/// FIFO ring of abuse events: appending to a full log evicts the oldest entry.
///
/// Timestamps are non-decreasing from front to back. An event stamped before
/// the current tail is raised to the tail's timestamp when appended.
pub struct InMemoryAbuseEventRepository {
    events: RwLock<VecDeque<AbuseEvent>>,
    capacity: usize,
}

impl InMemoryAbuseEventRepository {
    /// Creates a log holding at most `capacity` events (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Number of events currently held.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns whether the log is empty.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

impl Default for InMemoryAbuseEventRepository {
    fn default() -> Self {
        Self::new(DEFAULT_ABUSE_LOG_CAPACITY)
    }
}

#[async_trait]
impl AbuseEventRepository for InMemoryAbuseEventRepository {
    async fn append_event(&self, mut event: AbuseEvent) -> AppResult<()> {
        let mut events = self.events.write().await;
        if let Some(tail) = events.back() {
            event.timestamp = event.timestamp.max(tail.timestamp);
        }
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);

        Ok(())
    }

    async fn stats(&self) -> AppResult<AbuseStats> {
        Ok(AbuseStats::from_events(self.events.read().await.iter()))
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<AbuseEvent>> {
        let events = self.events.read().await;
        let skip = events.len().saturating_sub(limit);

        Ok(events.iter().skip(skip).cloned().collect())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut events = self.events.write().await;
        let mut removed = 0_u64;
        while events.front().is_some_and(|event| event.timestamp < cutoff) {
            events.pop_front();
            removed += 1;
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chatgate_application::AbuseEventRepository;
    use chatgate_domain::{AbuseEvent, AbuseEventKind, ClientId};
    use chrono::{Duration, Utc};

    use super::InMemoryAbuseEventRepository;

    fn event(index: usize, kind: AbuseEventKind) -> AbuseEvent {
        AbuseEvent::new(
            ClientId::from_raw(format!("client-{index}")),
            kind,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn full_log_evicts_oldest_first() {
        let repository = InMemoryAbuseEventRepository::default();

        for index in 0..1_001 {
            repository
                .append_event(event(index, AbuseEventKind::RateLimit))
                .await
                .unwrap_or_else(|_| panic!("test"));
        }

        assert_eq!(repository.len().await, 1_000);
        let recent = repository
            .list_recent(1_000)
            .await
            .unwrap_or_else(|_| panic!("test"));
        assert_eq!(recent[0].client_id.as_str(), "client-1");
        assert_eq!(recent[999].client_id.as_str(), "client-1000");
    }

    #[tokio::test]
    async fn recent_returns_tail_in_insertion_order() {
        let repository = InMemoryAbuseEventRepository::new(10);
        for index in 0..5 {
            repository
                .append_event(event(index, AbuseEventKind::InvalidContent))
                .await
                .unwrap_or_else(|_| panic!("test"));
        }

        let recent = repository
            .list_recent(2)
            .await
            .unwrap_or_else(|_| panic!("test"));
        let clients: Vec<&str> = recent.iter().map(|event| event.client_id.as_str()).collect();
        assert_eq!(clients, vec!["client-3", "client-4"]);

        let all = repository
            .list_recent(50)
            .await
            .unwrap_or_else(|_| panic!("test"));
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn stats_count_types_and_clients() {
        let repository = InMemoryAbuseEventRepository::new(10);
        for kind in [
            AbuseEventKind::RateLimit,
            AbuseEventKind::RateLimit,
            AbuseEventKind::InjectionAttempt,
        ] {
            repository
                .append_event(event(7, kind))
                .await
                .unwrap_or_else(|_| panic!("test"));
        }

        let stats = repository.stats().await.unwrap_or_else(|_| panic!("test"));

        assert_eq!(stats.total_logs, 3);
        assert_eq!(stats.by_type.get(&AbuseEventKind::RateLimit), Some(&2));
        assert_eq!(stats.top_abusers.len(), 1);
        assert_eq!(stats.top_abusers[0].count, 3);
    }

    #[tokio::test]
    async fn prune_drops_events_before_cutoff() {
        let repository = InMemoryAbuseEventRepository::new(10);
        let now = Utc::now();
        let mut old = event(1, AbuseEventKind::RateLimit);
        old.timestamp = now - Duration::hours(25);
        repository
            .append_event(old)
            .await
            .unwrap_or_else(|_| panic!("test"));
        repository
            .append_event(event(2, AbuseEventKind::RateLimit))
            .await
            .unwrap_or_else(|_| panic!("test"));

        let removed = repository
            .prune_before(now - Duration::hours(24))
            .await
            .unwrap_or_else(|_| panic!("test"));

        assert_eq!(removed, 1);
        assert!(!repository.is_empty().await);
    }

    #[tokio::test]
    async fn late_stamped_event_keeps_log_ordered() {
        let repository = InMemoryAbuseEventRepository::new(10);
        let now = Utc::now();
        let mut first = event(1, AbuseEventKind::RateLimit);
        first.timestamp = now;
        let mut second = event(2, AbuseEventKind::RateLimit);
        second.timestamp = now - Duration::milliseconds(5);
        for event in [first, second] {
            repository
                .append_event(event)
                .await
                .unwrap_or_else(|_| panic!("test"));
        }

        let recent = repository
            .list_recent(10)
            .await
            .unwrap_or_else(|_| panic!("test"));
        assert_eq!(recent[1].client_id.as_str(), "client-2");
        assert_eq!(recent[1].timestamp, now);

        let removed = repository
            .prune_before(now - Duration::milliseconds(1))
            .await
            .unwrap_or_else(|_| panic!("test"));
        assert_eq!(removed, 0);
        assert_eq!(repository.len().await, 2);
    }

    #[tokio::test]
    async fn prune_trims_only_the_expired_prefix() {
        let repository = InMemoryAbuseEventRepository::new(10);
        let now = Utc::now();
        for (index, age_hours) in [(1, 30), (2, 26), (3, 1), (4, 0)] {
            let mut entry = event(index, AbuseEventKind::InvalidContent);
            entry.timestamp = now - Duration::hours(age_hours);
            repository
                .append_event(entry)
                .await
                .unwrap_or_else(|_| panic!("test"));
        }

        let removed = repository
            .prune_before(now - Duration::hours(24))
            .await
            .unwrap_or_else(|_| panic!("test"));

        assert_eq!(removed, 2);
        let remaining = repository
            .list_recent(10)
            .await
            .unwrap_or_else(|_| panic!("test"));
        let clients: Vec<&str> = remaining.iter().map(|event| event.client_id.as_str()).collect();
        assert_eq!(clients, vec!["client-3", "client-4"]);
    }
}
