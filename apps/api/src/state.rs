use std::sync::Arc;

use chatgate_application::{
    AbuseEventService, ChatService, RateLimitService, ResponseCacheService,
};
use chatgate_core::{Clock, NonEmptyString};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: ChatService,
    pub abuse_event_service: AbuseEventService,
    pub rate_limit_service: RateLimitService,
    pub response_cache_service: ResponseCacheService,
    pub admin_token: NonEmptyString,
    pub clock: Arc<dyn Clock>,
}
