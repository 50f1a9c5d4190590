//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_abuse_event_repository;
mod in_memory_rate_limit_repository;
mod in_memory_response_cache;
mod ollama_chat_backend;

pub use in_memory_abuse_event_repository::{
    DEFAULT_ABUSE_LOG_CAPACITY, InMemoryAbuseEventRepository,
};
pub use in_memory_rate_limit_repository::InMemoryRateLimitRepository;
pub use in_memory_response_cache::InMemoryResponseCache;
pub use ollama_chat_backend::{OllamaChatBackend, OllamaSettings};
