use std::sync::Arc;
use std::time::Duration;

use chatgate_core::AppError;
use chatgate_infrastructure::{OllamaChatBackend, OllamaSettings};

use crate::api_config::ApiConfig;

pub fn build_ollama_backend(config: &ApiConfig) -> Result<Arc<OllamaChatBackend>, AppError> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.ollama.timeout_seconds))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    Ok(Arc::new(OllamaChatBackend::new(
        http_client,
        OllamaSettings {
            base_url: config.ollama.base_url.clone(),
            model: config.ollama.model.clone(),
            temperature: config.ollama.temperature,
        },
    )))
}
