//! Generative-text backend abstraction and implementations.
//!
//! Defines the [`CompletionBackend`] trait and concrete implementations:
//! - **[`DisabledBackend`]**: returns errors; every score falls back to zero.
//! - **[`OpenAiBackend`]**: calls an OpenAI-compatible `/chat/completions`
//!   endpoint with retry and backoff.
//!
//! # Backend Selection
//!
//! Use [`create_backend`] to instantiate the backend named by the
//! configuration:
//!
//! ```rust,no_run
//! # use rampup::config::{Credentials, HttpConfig, LlmConfig};
//! # use rampup::llm::create_backend;
//! let mut config = LlmConfig::default();
//! config.provider = "disabled".to_string();
//! let backend = create_backend(&config, &HttpConfig::default(), &Credentials::default()).unwrap();
//! assert_eq!(backend.model_name(), "disabled");
//! ```
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: `retry_backoff_ms` doubled per attempt (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Credentials, HttpConfig, LlmConfig};
use crate::error::RampUpError;

/// A chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Trait for generative-text backends.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Send a request and return the first choice's text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, RampUpError>;
}

// ============ Disabled Backend ============

/// A backend that refuses every request.
///
/// Used when `llm.provider = "disabled"`. Scoring still runs the fetch and
/// decode stages, then fails to zero.
pub struct DisabledBackend;

#[async_trait]
impl CompletionBackend for DisabledBackend {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String, RampUpError> {
        Err(RampUpError::Config("generative backend is disabled".to_string()))
    }
}

// ============ OpenAI Backend ============

/// Backend for OpenAI-compatible chat-completion APIs.
///
/// Calls `POST {base_url}/chat/completions` with bearer authentication.
pub struct OpenAiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl OpenAiBackend {
    pub fn new(config: &LlmConfig, http: &HttpConfig, api_key: impl Into<String>) -> Result<Self> {
        if config.model.trim().is_empty() {
            bail!("llm.model required for OpenAI backend");
        }
        Ok(Self {
            client: http.client()?,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff * (1u32 << (attempt - 1).min(5))
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, RampUpError> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff(attempt);
                tracing::debug!(attempt, ?delay, "retrying completion request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body = response.text().await?;
                        return parse_completion(&body);
                    }

                    // Rate limited or server error, retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(RampUpError::Transport(format!(
                            "completion API error {}: {}",
                            status,
                            body_text.trim()
                        )));
                        continue;
                    }

                    // Client error (not 429), don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(RampUpError::Transport(format!(
                        "completion API error {}: {}",
                        status,
                        body_text.trim()
                    )));
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            RampUpError::Transport("completion failed after retries".to_string())
        }))
    }
}

/// Extract `choices[0].message.content` from a chat-completion response body.
pub fn parse_completion(body: &str) -> Result<String, RampUpError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| RampUpError::BackendResponse(format!("invalid completion body: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| RampUpError::BackendResponse("completion has no message content".into()))
}

/// Create the [`CompletionBackend`] named by `config.provider`.
///
/// | Config Value | Backend |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledBackend`] |
/// | `"openai"` | [`OpenAiBackend`] |
pub fn create_backend(
    config: &LlmConfig,
    http: &HttpConfig,
    credentials: &Credentials,
) -> Result<Arc<dyn CompletionBackend>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledBackend)),
        "openai" => Ok(Arc::new(OpenAiBackend::new(
            config,
            http,
            credentials.llm_token.clone(),
        )?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}
