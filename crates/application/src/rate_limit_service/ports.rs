use async_trait::async_trait;
use chatgate_core::AppResult;
use chatgate_domain::{ClientId, WindowDecision};
use chrono::{DateTime, Utc};

use super::config::RateLimitRule;

/// Repository port for per-client window state.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Records one request for the client at `now`.
    ///
    /// Reading, replacing or incrementing the window and storing it must be
    /// atomic per client: two concurrent calls may never both be admitted on
    /// the last free slot.
    async fn record_request(
        &self,
        client_id: &ClientId,
        rule: &RateLimitRule,
        now: DateTime<Utc>,
    ) -> AppResult<WindowDecision>;

    /// Removes windows that expired before `now`.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
