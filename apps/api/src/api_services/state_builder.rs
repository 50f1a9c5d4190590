use std::sync::Arc;

use chatgate_application::{
    AbuseEventService, AdmissionService, ChatBackend, ChatService, FallbackResponses,
    RateLimitService, ResponseCacheService,
};
use chatgate_core::{AppError, Clock};
use chatgate_domain::ContentValidator;
use chatgate_infrastructure::{
    InMemoryAbuseEventRepository, InMemoryRateLimitRepository, InMemoryResponseCache,
};
use chrono::Duration;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(
    config: &ApiConfig,
    clock: Arc<dyn Clock>,
    chat_backend: Arc<dyn ChatBackend>,
) -> Result<AppState, AppError> {
    let abuse_event_service = AbuseEventService::new(
        Arc::new(InMemoryAbuseEventRepository::new(config.abuse_log_capacity)),
        clock.clone(),
        Duration::hours(config.abuse_log_retention_hours),
    );
    let rate_limit_service = RateLimitService::new(
        Arc::new(InMemoryRateLimitRepository::new()),
        abuse_event_service.clone(),
        clock.clone(),
        config.rate_limit_rule,
    );
    let response_cache_service = ResponseCacheService::new(
        Arc::new(InMemoryResponseCache::new()),
        clock.clone(),
        Duration::seconds(config.response_cache_ttl_seconds),
    );

    let admission_service = AdmissionService::new(
        rate_limit_service.clone(),
        Arc::new(ContentValidator::new(config.max_message_length)?),
        response_cache_service.clone(),
        abuse_event_service.clone(),
    )
    .with_cache_hit_logging(config.abuse_log_cache_hits);

    let chat_service = ChatService::new(
        admission_service,
        chat_backend,
        config.system_prompt.clone(),
        FallbackResponses::default(),
    );

    Ok(AppState {
        chat_service,
        abuse_event_service,
        rate_limit_service,
        response_cache_service,
        admin_token: config.admin_token.clone(),
        clock,
    })
}
