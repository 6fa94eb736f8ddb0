//! Scripted chat model for tests and offline development.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::model::ChatModel;
use crate::request::ChatRequest;

/// A [`ChatModel`] that replays scripted replies in order and records every
/// request it receives.
///
/// When the script runs out, the fallback reply is returned if one is set,
/// otherwise the call fails with [`ModelError::Request`].
///
/// # Example
///
/// ```rust
/// use triage_model::MockChatModel;
///
/// let model = MockChatModel::new().with_reply(r#"{"symptoms": ["fever"]}"#);
/// assert_eq!(model.call_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockChatModel {
    script: Mutex<VecDeque<Result<String>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: ModelError) -> Self {
        self.push(Err(error));
        self
    }

    /// Reply used once the script is exhausted.
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, entry: Result<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        match next {
            Some(entry) => entry,
            None => self.fallback.clone().ok_or_else(|| ModelError::Request {
                provider: "mock".to_string(),
                message: "no scripted reply left".to_string(),
            }),
        }
    }
}
