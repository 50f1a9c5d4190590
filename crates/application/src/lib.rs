//! Application services and ports.

#![forbid(unsafe_code)]

mod abuse_event_service;
mod admission_service;
mod chat_service;
mod rate_limit_service;
mod response_cache_service;

#[cfg(test)]
mod test_support;

pub use abuse_event_service::{AbuseEventRepository, AbuseEventService};
pub use admission_service::{
    AdmissionDecision, AdmissionRejection, AdmissionRequest, AdmissionService,
};
pub use chat_service::{
    ChatBackend, ChatOutcome, ChatPrompt, ChatRequest, ChatRequestKind, ChatService,
    DEFAULT_FALLBACK_RESPONSES, DEFAULT_SYSTEM_PROMPT, FallbackResponses, INTERNAL_ERROR_REPLY,
    MissionContext, build_user_prompt,
};
pub use rate_limit_service::{
    RateLimitOutcome, RateLimitRepository, RateLimitRule, RateLimitService,
};
pub use response_cache_service::{CacheLookup, ResponseCacheRepository, ResponseCacheService};
