use std::collections::BTreeMap;

use chatgate_domain::{AbuseEvent, AbuseStats, DetailValue};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Query string accepted by the monitoring endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitoringQuery {
    pub action: Option<String>,
    pub limit: Option<String>,
}

impl MonitoringQuery {
    pub const DEFAULT_LOG_LIMIT: usize = 50;

    /// Requested log limit; absent or unparsable values use the default.
    pub fn log_limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(Self::DEFAULT_LOG_LIMIT)
    }
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/top-abuser-response.ts"
)]
pub struct TopAbuserResponse {
    pub client_id: String,
    pub count: usize,
}

/// Aggregate abuse statistics.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/abuse-stats-response.ts"
)]
pub struct AbuseStatsResponse {
    pub total_logs: usize,
    #[ts(type = "Record<string, number>")]
    pub by_type: BTreeMap<String, usize>,
    pub top_abusers: Vec<TopAbuserResponse>,
}

impl From<AbuseStats> for AbuseStatsResponse {
    fn from(value: AbuseStats) -> Self {
        Self {
            total_logs: value.total_logs,
            by_type: value
                .by_type
                .into_iter()
                .map(|(kind, count)| (kind.as_str().to_owned(), count))
                .collect(),
            top_abusers: value
                .top_abusers
                .into_iter()
                .map(|abuser| TopAbuserResponse {
                    client_id: abuser.client_id.to_string(),
                    count: abuser.count,
                })
                .collect(),
        }
    }
}

/// One abuse log entry.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/abuse-event-response.ts"
)]
pub struct AbuseEventResponse {
    pub timestamp: String,
    pub client_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "Record<string, string | number | boolean> | undefined")]
    pub details: Option<BTreeMap<String, DetailValue>>,
}

impl From<AbuseEvent> for AbuseEventResponse {
    fn from(value: AbuseEvent) -> Self {
        Self {
            timestamp: value.timestamp.to_rfc3339(),
            client_id: value.client_id.to_string(),
            kind: value.kind.as_str().to_owned(),
            message: value.message,
            details: (!value.details.is_empty()).then_some(value.details),
        }
    }
}

/// Recent abuse log entries, oldest first.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/abuse-logs-response.ts"
)]
pub struct AbuseLogsResponse {
    pub logs: Vec<AbuseEventResponse>,
    pub timestamp: String,
}

/// Usage description returned when no action is given.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/monitoring-description-response.ts"
)]
pub struct MonitoringDescriptionResponse {
    pub message: String,
    pub endpoints: Vec<String>,
}

impl Default for MonitoringDescriptionResponse {
    fn default() -> Self {
        Self {
            message: "Monitoring API for abuse prevention".to_owned(),
            endpoints: vec![
                "/api/abuse-monitoring?action=stats - Get abuse statistics".to_owned(),
                "/api/abuse-monitoring?action=logs&limit=50 - Get recent abuse logs".to_owned(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use chatgate_domain::{AbuseEvent, AbuseEventKind, ClientId};
    use chrono::Utc;

    use super::{AbuseEventResponse, MonitoringQuery};

    #[test]
    fn log_limit_defaults_when_missing_or_garbage() {
        let missing = MonitoringQuery::default();
        let garbage = MonitoringQuery {
            action: Some("logs".to_owned()),
            limit: Some("abc".to_owned()),
        };
        let explicit = MonitoringQuery {
            action: Some("logs".to_owned()),
            limit: Some("5".to_owned()),
        };

        assert_eq!(missing.log_limit(), 50);
        assert_eq!(garbage.log_limit(), 50);
        assert_eq!(explicit.log_limit(), 5);
    }

    #[test]
    fn event_serializes_with_transport_names() {
        let event = AbuseEvent::new(
            ClientId::from_raw("10.0.0.1:s1"),
            AbuseEventKind::RateLimit,
            Utc::now(),
        )
        .with_detail("attemptedCount", 10_u32);

        let value = serde_json::to_value(AbuseEventResponse::from(event))
            .unwrap_or_else(|_| panic!("test"));

        assert_eq!(value["type"], "rate-limit");
        assert_eq!(value["clientId"], "10.0.0.1:s1");
        assert_eq!(value["details"]["attemptedCount"], 10);
        assert!(value.get("message").is_none());
    }
}
