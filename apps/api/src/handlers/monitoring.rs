use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};

use crate::dto::{
    AbuseEventResponse, AbuseLogsResponse, AbuseStatsResponse, MonitoringDescriptionResponse,
    MonitoringQuery,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn monitoring_handler(
    State(state): State<AppState>,
    Query(query): Query<MonitoringQuery>,
) -> ApiResult<Response> {
    match query.action.as_deref() {
        Some("stats") => {
            let stats = state.abuse_event_service.stats().await?;
            Ok(Json(AbuseStatsResponse::from(stats)).into_response())
        }
        Some("logs") => {
            let logs = state
                .abuse_event_service
                .recent(query.log_limit())
                .await?
                .into_iter()
                .map(AbuseEventResponse::from)
                .collect();
            Ok(Json(AbuseLogsResponse {
                logs,
                timestamp: state.clock.now().to_rfc3339(),
            })
            .into_response())
        }
        _ => Ok(Json(MonitoringDescriptionResponse::default()).into_response()),
    }
}
