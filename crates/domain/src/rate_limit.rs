//! Fixed-window rate limit state.
//!
//! A window admits up to `max_requests` and then rejects until `reset_at`.
//! Windows do not slide, so a client may burst at the end of one window and
//! again at the start of the next.

use chatgate_core::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Per-client counter for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientWindowState {
    /// Requests admitted in the current window.
    pub count: u32,
    /// Instant after which the window is replaced.
    pub reset_at: DateTime<Utc>,
}

/// Outcome of recording one request against a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// Request admitted; `count` includes it.
    Allowed {
        /// Admitted requests in the window so far.
        count: u32,
    },
    /// Request rejected; the window is left untouched.
    Limited {
        /// Count held by the window when the request arrived.
        attempted_count: u32,
        /// Whole seconds until the window resets, rounded up.
        retry_after_seconds: i64,
    },
}

impl ClientWindowState {
    /// Opens a fresh window containing one request.
    ///
    /// Fails when `now + window` is outside the representable time range.
    pub fn open(now: DateTime<Utc>, window: Duration) -> AppResult<Self> {
        let reset_at = now.checked_add_signed(window).ok_or_else(|| {
            AppError::Validation(format!(
                "rate limit window of {}s is out of range",
                window.num_seconds()
            ))
        })?;

        Ok(Self { count: 1, reset_at })
    }

    /// Returns whether the window has passed its reset instant.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_at
    }

    /// Seconds until reset, rounded up from milliseconds.
    #[must_use]
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> i64 {
        let remaining_ms = (self.reset_at - now).num_milliseconds().max(0);
        (remaining_ms + 999) / 1_000
    }

    /// Records one request against `existing`, replacing it when expired.
    ///
    /// Returns the state to store and the decision. A rejected request does
    /// not increment the counter.
    pub fn record(
        existing: Option<Self>,
        max_requests: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<(Self, WindowDecision)> {
        let Some(mut state) = existing.filter(|state| !state.is_expired(now)) else {
            let state = Self::open(now, window)?;
            return Ok((state, WindowDecision::Allowed { count: state.count }));
        };

        if state.count < max_requests {
            state.count += 1;
            return Ok((state, WindowDecision::Allowed { count: state.count }));
        }

        Ok((
            state,
            WindowDecision::Limited {
                attempted_count: state.count,
                retry_after_seconds: state.retry_after_seconds(now),
            },
        ))
    }
}
