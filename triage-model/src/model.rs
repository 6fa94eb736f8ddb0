//! The chat model trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::request::ChatRequest;

/// A chat-completion backend.
///
/// Implementations send the full message list in one call and return the
/// assistant's text. They perform no retries: a transport failure or a
/// non-success status surfaces as an error to the caller.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model identifier used for requests.
    fn name(&self) -> &str;

    /// Run a single completion and return the content of the first choice.
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}
