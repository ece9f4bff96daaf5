//! OpenAI-compatible chat completions model.
//!
//! Works against OpenAI or any service exposing `/chat/completions`
//! (Groq, Ollama, vLLM, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::{Deserialize, Serialize};
use studydesk_types::{ChatMessage, config_defaults as defaults};
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::model::ChatModel;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the OpenAI-compatible model.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key (optional for local services like Ollama).
    pub api_key: Option<String>,

    /// Base URL for the API, without the trailing `/chat/completions`.
    pub base_url: String,

    /// Model identifier sent with each request.
    pub model: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Sampling temperature, if overriding the server default.
    pub temperature: Option<f32>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: defaults::LLM_BASE_URL.to_string(),
            model: defaults::LLM_MODEL.to_string(),
            timeout: Duration::from_secs(defaults::LLM_TIMEOUT_SECS),
            temperature: None,
        }
    }
}

impl OpenAiConfig {
    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────────────────────────────────────

/// Chat model backed by an OpenAI-compatible HTTP API.
pub struct OpenAiChatModel {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiChatModel {
    /// Create a new model client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn add_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(header::CONTENT_TYPE, "application/json");

        if let Some(ref api_key) = self.config.api_key {
            builder.header(header::AUTHORIZATION, format!("Bearer {}", api_key))
        } else {
            builder
        }
    }

    fn to_request<'a>(&'a self, messages: &'a [ChatMessage]) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.config.temperature,
        }
    }

    async fn handle_error_response(response: Response) -> ChatError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error_from_body(status.as_u16(), &body)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = self.to_request(messages);

        debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .add_headers(self.client.post(self.completions_url()))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let body = response.text().await?;
        parse_completion(&body)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Extract the assistant text from a chat completion body.
fn parse_completion(body: &str) -> Result<String> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|e| ChatError::Serialization(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ChatError::Model("response contained no message content".to_string()))
}

/// Map a non-success status and body to an error.
fn error_from_body(status: u16, body: &str) -> ChatError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

    match status {
        401 | 403 => ChatError::Auth(message),
        429 => ChatError::RateLimit(message),
        _ => ChatError::Model(message),
    }
}
