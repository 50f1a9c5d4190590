use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use chatgate_core::{AppResult, Clock};
use chatgate_domain::{AbuseEvent, AbuseEventKind, AbuseStats, ClientId};

/// Repository port for the bounded abuse event log.
#[async_trait]
pub trait AbuseEventRepository: Send + Sync {
    /// Appends an event, evicting the oldest entry when the log is full.
    ///
    /// Implementations keep the log ordered by timestamp, so an event stamped
    /// before the current tail takes the tail's timestamp.
    async fn append_event(&self, event: AbuseEvent) -> AppResult<()>;

    /// Aggregates the events currently held.
    async fn stats(&self) -> AppResult<AbuseStats>;

    /// Returns up to `limit` most recent events, oldest first.
    async fn list_recent(&self, limit: usize) -> AppResult<Vec<AbuseEvent>>;

    /// Drops the prefix of events recorded before `cutoff` and returns how many
    /// were removed.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Application service for abuse event recording and reporting.
#[derive(Clone)]
pub struct AbuseEventService {
    repository: Arc<dyn AbuseEventRepository>,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl AbuseEventService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AbuseEventRepository>,
        clock: Arc<dyn Clock>,
        retention: Duration,
    ) -> Self {
        Self {
            repository,
            clock,
            retention,
        }
    }

    /// Starts an event stamped with the current time.
    #[must_use]
    pub fn new_event(&self, client_id: ClientId, kind: AbuseEventKind) -> AbuseEvent {
        AbuseEvent::new(client_id, kind, self.clock.now())
    }

    /// Appends an event to the log.
    pub async fn record_event(&self, event: AbuseEvent) -> AppResult<()> {
        tracing::warn!(
            client_id = %event.client_id,
            kind = event.kind.as_str(),
            message = event.message.as_deref().unwrap_or_default(),
            "abuse event recorded"
        );
        self.repository.append_event(event).await
    }

    /// Returns aggregate statistics.
    pub async fn stats(&self) -> AppResult<AbuseStats> {
        self.repository.stats().await
    }

    /// Returns up to `limit` most recent events, oldest first.
    pub async fn recent(&self, limit: usize) -> AppResult<Vec<AbuseEvent>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        self.repository.list_recent(limit).await
    }

    /// Drops events older than the retention period.
    pub async fn prune_expired(&self) -> AppResult<u64> {
        let cutoff = self.clock.now() - self.retention;
        let removed = self.repository.prune_before(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, "pruned expired abuse events");
        }
        Ok(removed)
    }
}
