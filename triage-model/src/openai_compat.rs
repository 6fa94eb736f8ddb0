//! Client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Groq is the default target, but any server speaking the same wire format
//! (OpenAI, vLLM, Ollama's compatibility layer) works by changing the base URL.
//!
//! # Example
//!
//! ```rust,ignore
//! use triage_model::{ChatMessage, ChatModel, ChatRequest, OpenAICompatibleClient, OpenAICompatibleConfig};
//!
//! let client = OpenAICompatibleClient::new(OpenAICompatibleConfig::groq(api_key))?;
//! let reply = client.complete(ChatRequest::new(vec![ChatMessage::user("hi")])).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::model::ChatModel;
use crate::request::{ChatMessage, ChatRequest};

/// Groq's OpenAI-compatible API base.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// The default Groq reasoning model.
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default timeout applied to every completion request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Configuration for [`OpenAICompatibleClient`].
#[derive(Debug, Clone)]
pub struct OpenAICompatibleConfig {
    pub api_key: String,
    /// Base URL without the trailing `/chat/completions`.
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    /// Name used in logs and error messages.
    pub provider: String,
}

impl OpenAICompatibleConfig {
    /// Create a config for an arbitrary OpenAI-compatible server.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            provider: "openai-compatible".to_string(),
        }
    }

    /// Create a config targeting Groq with the default reasoning model.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new(api_key, GROQ_API_BASE, GROQ_DEFAULT_MODEL).with_provider("Groq")
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// A [`ChatModel`] backed by an OpenAI-compatible HTTP API.
pub struct OpenAICompatibleClient {
    client: reqwest::Client,
    config: OpenAICompatibleConfig,
}

impl OpenAICompatibleClient {
    /// Build a client. Fails when the API key is empty or the HTTP client
    /// cannot be constructed.
    pub fn new(config: OpenAICompatibleConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::Config(format!(
                "{} API key must not be empty",
                config.provider
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// The configured provider name.
    pub fn provider(&self) -> &str {
        &self.config.provider
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── ChatModel implementation ───────────────────────────────────────

#[async_trait]
impl ChatModel for OpenAICompatibleClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let provider = self.config.provider.as_str();
        debug!(
            provider,
            model = %self.config.model,
            messages = request.messages.len(),
            json_response = request.json_response,
            "sending chat completion"
        );

        let body = CompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider, error = %e, "completion request failed");
                ModelError::Request { provider: provider.to_string(), message: e.to_string() }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);

            error!(provider, %status, "completion API error");
            return Err(ModelError::Api {
                provider: provider.to_string(),
                status: status.as_u16(),
                body: detail,
            });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!(provider, error = %e, "failed to parse completion response");
            ModelError::Parse {
                provider: provider.to_string(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let choice = completion.choices.into_iter().next().ok_or_else(|| ModelError::Parse {
            provider: provider.to_string(),
            message: "response contained no choices".to_string(),
        })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groq_config_defaults() {
        let config = OpenAICompatibleConfig::groq("key");
        assert_eq!(config.base_url, GROQ_API_BASE);
        assert_eq!(config.model, GROQ_DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.completions_url(), "https://api.groq.com/openai/v1/chat/completions");
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let config = OpenAICompatibleConfig::new("key", "http://localhost:11434/v1/", "llama3");
        assert_eq!(config.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = OpenAICompatibleClient::new(OpenAICompatibleConfig::groq("  "));
        assert!(matches!(result, Err(ModelError::Config(_))));
    }

    #[test]
    fn json_mode_serializes_response_format() {
        let messages = vec![ChatMessage::user("hi")];
        let body = CompletionRequest {
            model: "m",
            messages: &messages,
            temperature: 0.1,
            max_tokens: 400,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["max_tokens"], 400);
        assert_eq!(value["messages"][0]["role"], "user");

        let plain = CompletionRequest { response_format: None, ..body };
        let value = serde_json::to_value(&plain).unwrap();
        assert!(value.get("response_format").is_none());
    }
}
