//! Abuse event types and aggregate statistics.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chatgate_core::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ClientId;

/// Maximum number of clients reported in [`AbuseStats::top_abusers`].
pub const TOP_ABUSERS_LIMIT: usize = 10;

/// Category of a recorded abuse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbuseEventKind {
    /// Client exceeded its request window.
    RateLimit,
    /// Message matched a spam heuristic.
    InvalidContent,
    /// Message matched a query or instruction injection heuristic.
    InjectionAttempt,
    /// Response was served from the cache.
    CacheHit,
}

impl AbuseEventKind {
    /// Returns the stable transport value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate-limit",
            Self::InvalidContent => "invalid-content",
            Self::InjectionAttempt => "injection-attempt",
            Self::CacheHit => "cache-hit",
        }
    }
}

impl FromStr for AbuseEventKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "rate-limit" => Ok(Self::RateLimit),
            "invalid-content" => Ok(Self::InvalidContent),
            "injection-attempt" => Ok(Self::InjectionAttempt),
            "cache-hit" => Ok(Self::CacheHit),
            _ => Err(AppError::Validation(format!(
                "unknown abuse event kind '{value}'"
            ))),
        }
    }
}

/// Primitive value attached to an abuse event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Free text.
    Text(String),
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DetailValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for DetailValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One notable occurrence recorded by the admission pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbuseEvent {
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// Client the event is attributed to.
    pub client_id: ClientId,
    /// Event category.
    pub kind: AbuseEventKind,
    /// Optional human-readable description.
    pub message: Option<String>,
    /// Flat structured details.
    pub details: BTreeMap<String, DetailValue>,
}

impl AbuseEvent {
    /// Creates an event without message or details.
    #[must_use]
    pub fn new(client_id: ClientId, kind: AbuseEventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            client_id,
            kind,
            message: None,
            details: BTreeMap::new(),
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches one structured detail.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Number of events attributed to one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbuserCount {
    /// Client identifier.
    pub client_id: ClientId,
    /// Events attributed to the client.
    pub count: usize,
}

/// Aggregate view over the abuse event log.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AbuseStats {
    /// Events currently held.
    pub total_logs: usize,
    /// Event count per kind.
    pub by_type: BTreeMap<AbuseEventKind, usize>,
    /// Most frequent clients, count descending then client id ascending.
    pub top_abusers: Vec<AbuserCount>,
}

impl AbuseStats {
    /// Aggregates events in a single pass.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a AbuseEvent>) -> Self {
        let mut total_logs = 0;
        let mut by_type = BTreeMap::new();
        let mut per_client: HashMap<&ClientId, usize> = HashMap::new();

        for event in events {
            total_logs += 1;
            *by_type.entry(event.kind).or_insert(0) += 1;
            *per_client.entry(&event.client_id).or_insert(0) += 1;
        }

        let mut top_abusers: Vec<AbuserCount> = per_client
            .into_iter()
            .map(|(client_id, count)| AbuserCount {
                client_id: client_id.clone(),
                count,
            })
            .collect();
        top_abusers.sort_by(|left, right| {
            right
                .count
                .cmp(&left.count)
                .then_with(|| left.client_id.cmp(&right.client_id))
        });
        top_abusers.truncate(TOP_ABUSERS_LIMIT);

        Self {
            total_logs,
            by_type,
            top_abusers,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn event(client: &str, kind: AbuseEventKind) -> AbuseEvent {
        AbuseEvent::new(ClientId::from_raw(client), kind, Utc::now())
    }

    #[test]
    fn kind_round_trips_through_transport_value() {
        for kind in [
            AbuseEventKind::RateLimit,
            AbuseEventKind::InvalidContent,
            AbuseEventKind::InjectionAttempt,
            AbuseEventKind::CacheHit,
        ] {
            assert_eq!(AbuseEventKind::from_str(kind.as_str()).ok(), Some(kind));
        }
        assert!(AbuseEventKind::from_str("spam").is_err());
    }

    #[test]
    fn kind_serializes_as_kebab_case() {
        let encoded = serde_json::to_string(&AbuseEventKind::InjectionAttempt)
            .unwrap_or_else(|_| panic!("test"));
        assert_eq!(encoded, "\"injection-attempt\"");
    }

    #[test]
    fn details_serialize_as_plain_primitives() {
        let event = event("1.2.3.4:s", AbuseEventKind::RateLimit)
            .with_detail("attemptedCount", 10_u32)
            .with_detail("remaining", 42_i64)
            .with_detail("path", "/api/chat");
        let encoded =
            serde_json::to_value(&event.details).unwrap_or_else(|_| panic!("test"));

        assert_eq!(
            encoded,
            serde_json::json!({"attemptedCount": 10, "path": "/api/chat", "remaining": 42})
        );
    }

    #[test]
    fn stats_count_by_kind_and_client() {
        let events = vec![
            event("b", AbuseEventKind::RateLimit),
            event("a", AbuseEventKind::RateLimit),
            event("b", AbuseEventKind::InjectionAttempt),
            event("c", AbuseEventKind::InvalidContent),
        ];

        let stats = AbuseStats::from_events(&events);

        assert_eq!(stats.total_logs, 4);
        assert_eq!(stats.by_type.get(&AbuseEventKind::RateLimit), Some(&2));
        assert_eq!(stats.by_type.get(&AbuseEventKind::CacheHit), None);
        assert_eq!(stats.top_abusers[0].client_id.as_str(), "b");
        assert_eq!(stats.top_abusers[0].count, 2);
        // Ties on count are ordered by client id.
        assert_eq!(stats.top_abusers[1].client_id.as_str(), "a");
        assert_eq!(stats.top_abusers[2].client_id.as_str(), "c");
    }

    #[test]
    fn stats_keep_only_top_ten_clients() {
        let events: Vec<AbuseEvent> = (0..15)
            .map(|index| event(&format!("client-{index:02}"), AbuseEventKind::RateLimit))
            .collect();

        let stats = AbuseStats::from_events(&events);

        assert_eq!(stats.total_logs, 15);
        assert_eq!(stats.top_abusers.len(), TOP_ABUSERS_LIMIT);
        assert_eq!(stats.top_abusers[0].client_id.as_str(), "client-00");
        assert_eq!(stats.top_abusers[9].client_id.as_str(), "client-09");
    }
}
