//! Message and request types shared by every [`ChatModel`](crate::ChatModel).

use serde::{Deserialize, Serialize};

/// A single chat message. Roles are free-form strings and are forwarded
/// verbatim; `system`, `user` and `assistant` are the conventional values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// A chat-completion request.
///
/// # Example
///
/// ```rust
/// use triage_model::{ChatMessage, ChatRequest};
///
/// let request = ChatRequest::new(vec![ChatMessage::user("hello")])
///     .with_temperature(0.1)
///     .with_max_tokens(400)
///     .with_json_response();
/// assert!(request.json_response);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for a strict JSON object (`response_format: json_object`).
    pub json_response: bool,
}

impl ChatRequest {
    /// Create a request with the provider-neutral defaults (temperature 0.2, 800 tokens).
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages, temperature: 0.2, max_tokens: 800, json_response: false }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }
}
