use std::sync::Arc;

use chatgate_core::{AppResult, Clock};
use chatgate_domain::{AbuseEventKind, ClientId, WindowDecision};

use crate::AbuseEventService;

use super::config::RateLimitRule;
use super::ports::RateLimitRepository;

/// Admission result for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOutcome {
    /// Request fits in the current window.
    Allowed,
    /// Window is full.
    Limited {
        /// Whole seconds until the window resets.
        retry_after_seconds: i64,
    },
}

/// Application service for rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
    abuse_event_service: AbuseEventService,
    clock: Arc<dyn Clock>,
    rule: RateLimitRule,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RateLimitRepository>,
        abuse_event_service: AbuseEventService,
        clock: Arc<dyn Clock>,
        rule: RateLimitRule,
    ) -> Self {
        Self {
            repository,
            abuse_event_service,
            clock,
            rule,
        }
    }

    /// Returns the active rule.
    #[must_use]
    pub fn rule(&self) -> RateLimitRule {
        self.rule
    }

    /// Records the request and decides whether it is admitted.
    ///
    /// A rejection appends a `rate-limit` abuse event carrying the count the
    /// window held and the seconds remaining.
    pub async fn admit(&self, client_id: &ClientId) -> AppResult<RateLimitOutcome> {
        let now = self.clock.now();
        let decision = self
            .repository
            .record_request(client_id, &self.rule, now)
            .await?;

        match decision {
            WindowDecision::Allowed { .. } => Ok(RateLimitOutcome::Allowed),
            WindowDecision::Limited {
                attempted_count,
                retry_after_seconds,
            } => {
                let event = self
                    .abuse_event_service
                    .new_event(client_id.clone(), AbuseEventKind::RateLimit)
                    .with_message(format!(
                        "exceeded {} requests per window",
                        self.rule.max_requests
                    ))
                    .with_detail("attemptedCount", attempted_count)
                    .with_detail("remaining", retry_after_seconds);
                self.abuse_event_service.record_event(event).await?;

                Ok(RateLimitOutcome::Limited {
                    retry_after_seconds,
                })
            }
        }
    }

    /// Removes expired windows. Intended for periodic cleanup.
    pub async fn cleanup(&self) -> AppResult<u64> {
        self.repository.cleanup_expired(self.clock.now()).await
    }
}
