//! # triage-model
//!
//! Chat-completion transport for the clinical triage assistant.
//!
//! ## Overview
//!
//! - [`ChatModel`] - the async trait every stage of the pipeline talks to
//! - [`OpenAICompatibleClient`] - Groq (default) or any OpenAI-compatible API
//! - [`MockChatModel`] - scripted replies for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use triage_model::{ChatMessage, ChatModel, ChatRequest, OpenAICompatibleClient, OpenAICompatibleConfig};
//!
//! let model = OpenAICompatibleClient::new(OpenAICompatibleConfig::groq(
//!     std::env::var("GROQ_API_KEY")?,
//! ))?;
//! let reply = model
//!     .complete(ChatRequest::new(vec![ChatMessage::user("hello")]).with_temperature(0.3))
//!     .await?;
//! ```

pub mod error;
pub mod mock;
pub mod model;
pub mod openai_compat;
pub mod request;

pub use error::{ModelError, Result};
pub use mock::MockChatModel;
pub use model::ChatModel;
pub use openai_compat::{
    DEFAULT_TIMEOUT, GROQ_API_BASE, GROQ_DEFAULT_MODEL, OpenAICompatibleClient,
    OpenAICompatibleConfig,
};
pub use request::{ChatMessage, ChatRequest};
