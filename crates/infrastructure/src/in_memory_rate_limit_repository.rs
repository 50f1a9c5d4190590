//! In-memory rate limit repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chatgate_application::{RateLimitRepository, RateLimitRule};
use chatgate_core::{AppError, AppResult};
use chatgate_domain::{ClientId, ClientWindowState, WindowDecision};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// Process-local window table keyed by client identifier.
#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    windows: Mutex<HashMap<ClientId, ClientWindowState>>,
}

impl InMemoryRateLimitRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked clients.
    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn record_request(
        &self,
        client_id: &ClientId,
        rule: &RateLimitRule,
        now: DateTime<Utc>,
    ) -> AppResult<WindowDecision> {
        if rule.max_requests == 0 {
            return Err(AppError::Validation(
                "rate limit rule requires positive max_requests".to_owned(),
            ));
        }
        let window = rule.window()?;

        let mut windows = self.windows.lock().await;
        let (state, decision) = ClientWindowState::record(
            windows.get(client_id).copied(),
            rule.max_requests,
            window,
            now,
        )?;
        windows.insert(client_id.clone(), state);

        Ok(decision)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, state| !state.is_expired(now));

        Ok(u64::try_from(before - windows.len()).unwrap_or(u64::MAX))
    }
}
