//! In-process fakes for the application ports.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chatgate_core::{AppError, AppResult, ManualClock};
use chatgate_domain::{
    AbuseEvent, AbuseStats, CacheEntry, CacheKey, ClientId, ClientWindowState, ContentValidator,
    DEFAULT_MAX_MESSAGE_LENGTH, WindowDecision,
};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::{
    AbuseEventRepository, AbuseEventService, AdmissionService, ChatBackend, ChatPrompt,
    RateLimitRepository, RateLimitRule, RateLimitService, ResponseCacheRepository,
    ResponseCacheService,
};

#[derive(Default)]
pub(crate) struct FakeRateLimitRepository {
    windows: Mutex<HashMap<ClientId, ClientWindowState>>,
}

#[async_trait]
impl RateLimitRepository for FakeRateLimitRepository {
    async fn record_request(
        &self,
        client_id: &ClientId,
        rule: &RateLimitRule,
        now: DateTime<Utc>,
    ) -> AppResult<WindowDecision> {
        let mut windows = self.windows.lock().await;
        let (state, decision) = ClientWindowState::record(
            windows.get(client_id).copied(),
            rule.max_requests,
            rule.window()?,
            now,
        )?;
        windows.insert(client_id.clone(), state);
        Ok(decision)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, state| !state.is_expired(now));
        Ok((before - windows.len()) as u64)
    }
}

#[derive(Default)]
pub(crate) struct FakeAbuseEventRepository {
    events: Mutex<VecDeque<AbuseEvent>>,
}

impl FakeAbuseEventRepository {
    pub(crate) async fn events(&self) -> Vec<AbuseEvent> {
        self.events.lock().await.iter().cloned().collect()
    }
}

#[async_trait]
impl AbuseEventRepository for FakeAbuseEventRepository {
    async fn append_event(&self, event: AbuseEvent) -> AppResult<()> {
        self.events.lock().await.push_back(event);
        Ok(())
    }

    async fn stats(&self) -> AppResult<AbuseStats> {
        Ok(AbuseStats::from_events(self.events.lock().await.iter()))
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<AbuseEvent>> {
        let events = self.events.lock().await;
        let skip = events.len().saturating_sub(limit);
        Ok(events.iter().skip(skip).cloned().collect())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut events = self.events.lock().await;
        let before = events.len();
        events.retain(|event| event.timestamp >= cutoff);
        Ok((before - events.len()) as u64)
    }
}

#[derive(Default)]
pub(crate) struct FakeResponseCacheRepository {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl FakeResponseCacheRepository {
    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl ResponseCacheRepository for FakeResponseCacheRepository {
    async fn get_entry(
        &self,
        key: &CacheKey,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Option<CacheEntry>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.cached_at < stale_before => {
                entries.remove(key);
                Ok(None)
            }
            entry => Ok(entry.cloned()),
        }
    }

    async fn put_entry(&self, key: CacheKey, entry: CacheEntry) -> AppResult<()> {
        self.entries.lock().await.insert(key, entry);
        Ok(())
    }

    async fn remove_stored_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.cached_at >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}

/// Backend that answers with a numbered echo, or fails when told to.
#[derive(Default)]
pub(crate) struct FakeChatBackend {
    calls: AtomicUsize,
    failing: AtomicBool,
    prompts: Mutex<Vec<ChatPrompt>>,
}

impl FakeChatBackend {
    pub(crate) fn failing() -> Self {
        let backend = Self::default();
        backend.failing.store(true, Ordering::SeqCst);
        backend
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn prompts(&self) -> Vec<ChatPrompt> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl ChatBackend for FakeChatBackend {
    async fn complete(&self, prompt: &ChatPrompt) -> AppResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().await.push(prompt.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("backend offline".to_owned()));
        }
        Ok(format!("R{call}"))
    }
}

/// Wired services sharing one manual clock and inspectable fakes.
pub(crate) struct Harness {
    pub(crate) clock: ManualClock,
    pub(crate) abuse_events: Arc<FakeAbuseEventRepository>,
    pub(crate) cache: Arc<FakeResponseCacheRepository>,
    pub(crate) abuse_event_service: AbuseEventService,
    pub(crate) rate_limit_service: RateLimitService,
    pub(crate) cache_service: ResponseCacheService,
    pub(crate) admission_service: AdmissionService,
}

impl Harness {
    pub(crate) fn new(rule: RateLimitRule) -> Self {
        let clock = ManualClock::new(Utc::now());
        let abuse_events = Arc::new(FakeAbuseEventRepository::default());
        let cache = Arc::new(FakeResponseCacheRepository::default());

        let abuse_event_service = AbuseEventService::new(
            abuse_events.clone(),
            Arc::new(clock.clone()),
            Duration::hours(24),
        );
        let rate_limit_service = RateLimitService::new(
            Arc::new(FakeRateLimitRepository::default()),
            abuse_event_service.clone(),
            Arc::new(clock.clone()),
            rule,
        );
        let cache_service =
            ResponseCacheService::new(cache.clone(), Arc::new(clock.clone()), Duration::minutes(5));
        let validator = ContentValidator::new(DEFAULT_MAX_MESSAGE_LENGTH)
            .unwrap_or_else(|_| panic!("default content rules must compile"));
        let admission_service = AdmissionService::new(
            rate_limit_service.clone(),
            Arc::new(validator),
            cache_service.clone(),
            abuse_event_service.clone(),
        );

        Self {
            clock,
            abuse_events,
            cache,
            abuse_event_service,
            rate_limit_service,
            cache_service,
            admission_service,
        }
    }
}
