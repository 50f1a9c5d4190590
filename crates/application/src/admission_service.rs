//! Request admission: rate-limit, validate, consult the cache.

use std::sync::Arc;

use chatgate_core::AppResult;
use chatgate_domain::{
    AbuseEventKind, CacheKey, ClientId, ContentValidator, ContentVerdict, ContentViolation,
};

use crate::{
    AbuseEventService, CacheLookup, RateLimitOutcome, RateLimitService, ResponseCacheService,
};

/// Chat request as seen by the admission pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
    /// Identifier derived from transport metadata.
    pub client_id: ClientId,
    /// Raw user message.
    pub message: String,
    /// Optional mission context.
    pub mission_id: Option<String>,
    /// Optional step context.
    pub step_id: Option<String>,
}

/// Reason a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionRejection {
    /// The client's window is full.
    RateLimited {
        /// Whole seconds until the window resets.
        retry_after_seconds: i64,
    },
    /// The message failed validation.
    InvalidContent {
        /// User-facing reason.
        reason: String,
    },
}

impl AdmissionRejection {
    /// User-facing error text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::RateLimited {
                retry_after_seconds,
            } => format!(
                "⏳ Trop de requêtes. Réessayez dans {retry_after_seconds} secondes."
            ),
            Self::InvalidContent { reason } => reason.clone(),
        }
    }
}

/// Outcome of the admission pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Request must not reach the backend.
    Rejected(AdmissionRejection),
    /// A fresh response is already cached.
    CacheHit {
        /// Cached response text.
        response: String,
    },
    /// Request may be forwarded; store the response under `cache_key`.
    Forward {
        /// Message to forward.
        message: String,
        /// Key to store the backend response under.
        cache_key: CacheKey,
    },
}

/// Orchestrates rate limiting, validation and caching.
#[derive(Clone)]
pub struct AdmissionService {
    rate_limit_service: RateLimitService,
    validator: Arc<ContentValidator>,
    cache_service: ResponseCacheService,
    abuse_event_service: AbuseEventService,
    log_cache_hits: bool,
}

impl AdmissionService {
    /// Creates the pipeline from its collaborators.
    #[must_use]
    pub fn new(
        rate_limit_service: RateLimitService,
        validator: Arc<ContentValidator>,
        cache_service: ResponseCacheService,
        abuse_event_service: AbuseEventService,
    ) -> Self {
        Self {
            rate_limit_service,
            validator,
            cache_service,
            abuse_event_service,
            log_cache_hits: false,
        }
    }

    /// Enables `cache-hit` events.
    #[must_use]
    pub fn with_cache_hit_logging(mut self, enabled: bool) -> Self {
        self.log_cache_hits = enabled;
        self
    }

    /// Runs the pipeline for one request.
    ///
    /// A rate-limited request is counted against the window before anything
    /// else; validation failures still consume a slot.
    pub async fn admit(&self, request: AdmissionRequest) -> AppResult<AdmissionDecision> {
        let AdmissionRequest {
            client_id,
            message,
            mission_id,
            step_id,
        } = request;

        if let RateLimitOutcome::Limited {
            retry_after_seconds,
        } = self.rate_limit_service.admit(&client_id).await?
        {
            tracing::info!(%client_id, retry_after_seconds, "request rate limited");
            return Ok(AdmissionDecision::Rejected(
                AdmissionRejection::RateLimited {
                    retry_after_seconds,
                },
            ));
        }

        if let ContentVerdict::Rejected { reason, violation } = self.validator.validate(&message) {
            if let ContentViolation::Rule(category) = violation {
                let event = self
                    .abuse_event_service
                    .new_event(client_id.clone(), category.abuse_kind())
                    .with_message(category.abuse_message());
                self.abuse_event_service.record_event(event).await?;
            }

            return Ok(AdmissionDecision::Rejected(
                AdmissionRejection::InvalidContent { reason },
            ));
        }

        let cache_key = CacheKey::derive(&message, mission_id.as_deref(), step_id.as_deref());
        if let CacheLookup::Hit(response) = self.cache_service.lookup(&cache_key).await? {
            tracing::debug!(%cache_key, "serving cached response");
            if self.log_cache_hits {
                let event = self
                    .abuse_event_service
                    .new_event(client_id, AbuseEventKind::CacheHit)
                    .with_detail("cacheKey", cache_key.as_str());
                self.abuse_event_service.record_event(event).await?;
            }
            return Ok(AdmissionDecision::CacheHit { response });
        }

        Ok(AdmissionDecision::Forward { message, cache_key })
    }

    /// Stores a backend response for later reuse.
    pub async fn remember(&self, cache_key: CacheKey, response: &str) -> AppResult<()> {
        self.cache_service.store(cache_key, response).await
    }
}
