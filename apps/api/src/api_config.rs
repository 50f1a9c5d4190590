use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chatgate_application::{DEFAULT_SYSTEM_PROMPT, RateLimitRule};
use chatgate_core::{AppError, NonEmptyString};
use chatgate_domain::DEFAULT_MAX_MESSAGE_LENGTH;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEV_ADMIN_TOKEN: &str = "dev-token";
const ONE_DAY_SECONDS: i64 = 86_400;
const ONE_YEAR_HOURS: i64 = 8_760;

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: Url,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub pull_on_start: bool,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub rate_limit_rule: RateLimitRule,
    pub max_message_length: usize,
    pub response_cache_ttl_seconds: i64,
    pub abuse_log_capacity: usize,
    pub abuse_log_retention_hours: i64,
    pub abuse_log_sweep_interval_seconds: u64,
    pub abuse_log_cache_hits: bool,
    pub admin_token: NonEmptyString,
    pub system_prompt: String,
    pub ollama: OllamaConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = bounded_number(&lookup, "API_PORT", 3001_u16, u16::MAX)?;

        let rate_limit_rule = RateLimitRule::new(
            bounded_number(&lookup, "RATE_LIMIT_MAX_REQUESTS", 10_u32, 1_000_000)?,
            bounded_number(&lookup, "RATE_LIMIT_WINDOW_SECONDS", 60_i64, ONE_DAY_SECONDS)?,
        );
        let max_message_length =
            bounded_number(
            &lookup,
            "CHAT_MAX_MESSAGE_LENGTH",
            DEFAULT_MAX_MESSAGE_LENGTH,
            100_000,
        )?;
        let response_cache_ttl_seconds =
            bounded_number(&lookup, "RESPONSE_CACHE_TTL_SECONDS", 300_i64, ONE_DAY_SECONDS)?;

        let abuse_log_capacity = bounded_number(&lookup, "ABUSE_LOG_CAPACITY", 1_000_usize, 100_000)?;
        let abuse_log_retention_hours =
            bounded_number(&lookup, "ABUSE_LOG_RETENTION_HOURS", 24_i64, ONE_YEAR_HOURS)?;
        let abuse_log_sweep_interval_seconds =
            bounded_number(
            &lookup,
            "ABUSE_LOG_SWEEP_INTERVAL_SECONDS",
            3_600_u64,
            ONE_DAY_SECONDS.unsigned_abs(),
        )?;
        let abuse_log_cache_hits = flag(&lookup, "ABUSE_LOG_CACHE_HITS");

        let admin_token = match lookup("ADMIN_TOKEN") {
            Some(value) => NonEmptyString::new(value)
                .map_err(|_| AppError::Validation("ADMIN_TOKEN must not be empty".to_owned()))?,
            None => {
                warn!("ADMIN_TOKEN not set, monitoring endpoint uses the development token");
                NonEmptyString::new(DEV_ADMIN_TOKEN)?
            }
        };

        let system_prompt = lookup("CHAT_SYSTEM_PROMPT")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_owned());

        let base_url = lookup("OLLAMA_BASE_URL")
            .unwrap_or_else(|| "http://localhost:11434".to_owned());
        let base_url = Url::parse(&base_url)
            .map_err(|error| AppError::Validation(format!("invalid OLLAMA_BASE_URL: {error}")))?;
        let temperature = match lookup("OLLAMA_TEMPERATURE") {
            Some(value) => value
                .parse::<f32>()
                .ok()
                .filter(|temperature| temperature.is_finite() && *temperature >= 0.0)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "OLLAMA_TEMPERATURE must be a non-negative number, got '{value}'"
                    ))
                })?,
            None => 0.7,
        };
        let ollama = OllamaConfig {
            base_url,
            model: lookup("OLLAMA_MODEL")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| "mistral".to_owned()),
            temperature,
            timeout_seconds: bounded_number(&lookup, "OLLAMA_TIMEOUT_SECONDS", 30_u64, 600)?,
            pull_on_start: flag(&lookup, "OLLAMA_PULL_ON_START"),
        };

        Ok(Self {
            frontend_url,
            api_host,
            api_port,
            rate_limit_rule,
            max_message_length,
            response_cache_ttl_seconds,
            abuse_log_capacity,
            abuse_log_retention_hours,
            abuse_log_sweep_interval_seconds,
            abuse_log_cache_hits,
            admin_token,
            system_prompt,
            ollama,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn bounded_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
    max: T,
) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Default + Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };

    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() && value <= max => Ok(value),
        Ok(_) => Err(AppError::Validation(format!(
            "{name} must be between 1 and {max}, got '{raw}'"
        ))),
        Err(_) => Err(AppError::Validation(format!(
            "{name} must be a positive number, got '{raw}'"
        ))),
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> bool {
    lookup(name).is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chatgate_core::AppError;

    use super::ApiConfig;

    fn load(pairs: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(|name| values.get(name).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = load(&[]).unwrap_or_else(|_| panic!("test"));

        assert_eq!(config.api_port, 3001);
        assert_eq!(config.rate_limit_rule.max_requests, 10);
        assert_eq!(config.rate_limit_rule.window_seconds, 60);
        assert_eq!(config.max_message_length, 500);
        assert_eq!(config.response_cache_ttl_seconds, 300);
        assert_eq!(config.abuse_log_capacity, 1_000);
        assert!(!config.abuse_log_cache_hits);
        assert_eq!(config.admin_token.as_str(), "dev-token");
        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.ollama.base_url.as_str(), "http://localhost:11434/");
        assert!(!config.ollama.pull_on_start);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("RATE_LIMIT_MAX_REQUESTS", "3"),
            ("ABUSE_LOG_CACHE_HITS", "TRUE"),
            ("ADMIN_TOKEN", "s3cret"),
            ("OLLAMA_TEMPERATURE", "0.2"),
        ])
        .unwrap_or_else(|_| panic!("test"));

        assert_eq!(config.rate_limit_rule.max_requests, 3);
        assert!(config.abuse_log_cache_hits);
        assert_eq!(config.admin_token.as_str(), "s3cret");
        assert!((config.ollama.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_or_garbage_numbers_are_rejected() {
        assert!(matches!(
            load(&[("RATE_LIMIT_WINDOW_SECONDS", "0")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            load(&[("CHAT_MAX_MESSAGE_LENGTH", "lots")]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn out_of_range_durations_are_rejected() {
        for (name, value) in [
            ("RATE_LIMIT_WINDOW_SECONDS", "100000000000000"),
            ("RESPONSE_CACHE_TTL_SECONDS", "9223372036854775807"),
            ("ABUSE_LOG_RETENTION_HOURS", "9223372036854775807"),
            ("ABUSE_LOG_CAPACITY", "18446744073709551615"),
            ("RATE_LIMIT_WINDOW_SECONDS", "-5"),
        ] {
            assert!(
                matches!(load(&[(name, value)]), Err(AppError::Validation(_))),
                "{name}={value} should be rejected"
            );
        }

        let config = load(&[("RATE_LIMIT_WINDOW_SECONDS", "86400")])
            .unwrap_or_else(|_| panic!("test"));
        assert_eq!(config.rate_limit_rule.window_seconds, 86_400);
    }

    #[test]
    fn blank_admin_token_is_rejected() {
        assert!(matches!(
            load(&[("ADMIN_TOKEN", "  ")]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn invalid_backend_url_is_rejected() {
        assert!(matches!(
            load(&[("OLLAMA_BASE_URL", "not a url")]),
            Err(AppError::Validation(_))
        ));
    }
}
