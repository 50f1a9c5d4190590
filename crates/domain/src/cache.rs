//! Response cache keys and entries.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Prefix shared by every derived cache key.
pub const CACHE_KEY_PREFIX: &str = "cache-";

/// Deterministic key identifying a chat request for response reuse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a message and its optional mission context.
    ///
    /// Hashes `"{message}:{mission_id}:{step_id}"` (absent ids become empty
    /// strings) with a 32-bit rolling hash, `hash = hash * 31 + unit`, over
    /// UTF-16 code units with wrapping arithmetic. The key is the prefix
    /// followed by the hash magnitude. Collisions are tolerated: the cache is
    /// not a security boundary.
    #[must_use]
    pub fn derive(message: &str, mission_id: Option<&str>, step_id: Option<&str>) -> Self {
        let source = format!(
            "{message}:{}:{}",
            mission_id.unwrap_or_default(),
            step_id.unwrap_or_default()
        );
        let hash = source.encode_utf16().fold(0_i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        });

        Self(format!("{CACHE_KEY_PREFIX}{}", hash.unsigned_abs()))
    }

    /// Wraps an existing key string.
    #[must_use]
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CacheKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Memoized backend response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Payload returned verbatim on a repeat request.
    pub response: String,
    /// When the response was stored.
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stored at `cached_at`.
    #[must_use]
    pub fn new(response: impl Into<String>, cached_at: DateTime<Utc>) -> Self {
        Self {
            response: response.into(),
            cached_at,
        }
    }

    /// Returns whether the entry is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.cached_at > ttl
    }
}
