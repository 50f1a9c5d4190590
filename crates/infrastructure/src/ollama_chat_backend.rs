//! Ollama-backed chat completion adapter.

use async_trait::async_trait;
use chatgate_application::{ChatBackend, ChatPrompt};
use chatgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Connection settings for an Ollama server.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaSettings {
    /// Server base URL, e.g. `http://localhost:11434`.
    pub base_url: Url,
    /// Model name passed on every request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

/// HTTP client for Ollama's generate and pull endpoints.
pub struct OllamaChatBackend {
    http_client: reqwest::Client,
    settings: OllamaSettings,
}

impl OllamaChatBackend {
    /// Creates a backend. Request timeouts come from `http_client`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, mut settings: OllamaSettings) -> Self {
        if !settings.base_url.path().ends_with('/') {
            let path = format!("{}/", settings.base_url.path());
            settings.base_url.set_path(&path);
        }

        Self {
            http_client,
            settings,
        }
    }

    /// Configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.settings.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("invalid ollama endpoint '{path}': {error}"))
        })
    }

    /// Asks the server to download the configured model.
    pub async fn pull_model(&self) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.endpoint("api/pull")?)
            .json(&PullRequest {
                model: &self.settings.model,
                stream: false,
            })
            .send()
            .await
            .map_err(|error| AppError::Unavailable(format!("ollama pull failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Unavailable(format!(
                "ollama pull returned status {status}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ChatBackend for OllamaChatBackend {
    async fn complete(&self, prompt: &ChatPrompt) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.endpoint("api/generate")?)
            .json(&GenerateRequest {
                model: &self.settings.model,
                system: &prompt.system,
                prompt: &prompt.prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: self.settings.temperature,
                },
            })
            .send()
            .await
            .map_err(|error| AppError::Unavailable(format!("ollama request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(AppError::Unavailable(format!(
                "ollama generate returned status {status}: {body}"
            )));
        }

        let payload: GenerateResponse = response.json().await.map_err(|error| {
            AppError::Unavailable(format!("ollama returned an invalid payload: {error}"))
        })?;

        if payload.response.trim().is_empty() {
            return Err(AppError::Unavailable(
                "ollama returned an empty response".to_owned(),
            ));
        }

        Ok(payload.response)
    }
}
