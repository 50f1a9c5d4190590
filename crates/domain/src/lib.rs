//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod abuse;
mod cache;
mod client;
mod content_policy;
mod rate_limit;

pub use abuse::{
    AbuseEvent, AbuseEventKind, AbuseStats, AbuserCount, DetailValue, TOP_ABUSERS_LIMIT,
};
pub use cache::{CACHE_KEY_PREFIX, CacheEntry, CacheKey};
pub use client::{
    ClientId, SESSION_COOKIE_NAME, UNKNOWN_CLIENT_ADDRESS, client_address,
    session_token_from_cookie,
};
pub use content_policy::{
    ContentCategory, ContentRule, ContentValidator, ContentVerdict, ContentViolation,
    DEFAULT_MAX_MESSAGE_LENGTH, RuleMatcher, SPAM_REPEAT_RUN,
};
pub use rate_limit::{ClientWindowState, WindowDecision};
