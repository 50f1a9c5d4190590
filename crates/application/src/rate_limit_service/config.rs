use chatgate_core::{AppError, AppResult};
use chrono::Duration;

/// Default number of requests admitted per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 10;

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECONDS: i64 = 60;

/// Configuration for the chat rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Maximum number of requests admitted in one window.
    pub max_requests: u32,
    /// Window duration in seconds.
    pub window_seconds: i64,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }

    /// Window length as a duration.
    ///
    /// Fails for non-positive windows and for lengths chrono cannot represent.
    pub fn window(&self) -> AppResult<Duration> {
        Duration::try_seconds(self.window_seconds)
            .filter(|window| *window > Duration::zero())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "rate limit window of {}s is out of range",
                    self.window_seconds
                ))
            })
    }
}

impl Default for RateLimitRule {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECONDS)
    }
}
