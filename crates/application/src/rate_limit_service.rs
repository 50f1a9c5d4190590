//! Rate limiting ports and application service.
//!
//! Implements a fixed-window limiter: each client may send up to
//! `max_requests` within a window, after which requests are rejected until the
//! window resets. Rejections are recorded in the abuse event log.

mod config;
mod ports;
mod service;


pub use config::RateLimitRule;
pub use ports::RateLimitRepository;
pub use service::{RateLimitOutcome, RateLimitService};
