//! Follow-up chat about a triage result.
//!
//! Stateless: the caller sends its own history on every turn. Greetings and
//! acknowledgments get canned replies without a model call.

use std::sync::Arc;

use tracing::debug;
use triage_model::{ChatMessage, ChatModel, ChatRequest};

use crate::error::Result;
use crate::types::ConversationMessage;

pub const GREETING_REPLY: &str = "Hello 👋 I’m your clinical triage assistant.";
pub const ACKNOWLEDGMENT_REPLY: &str =
    "You’re welcome ✅. Do you want more details about the triage?";

/// Substring identifying a system history message that carries a triage result.
pub const TRIAGE_RESULT_MARKER: &str = "triage_result";

pub const CHAT_SYSTEM_PROMPT: &str = "You are a safe clinical assistant. \
You explain triage results, guidelines, and medical concepts. \
NEVER provide personal medical advice or dosing.";

pub const CHAT_TEMPERATURE: f32 = 0.3;
pub const CHAT_MAX_TOKENS: u32 = 600;

const GREETINGS: [&str; 3] = ["hi", "hello", "hey"];
const ACKNOWLEDGMENTS: [&str; 4] = ["ok", "okay", "thanks", "thank you"];

/// Canned reply for small talk, matched case-insensitively after trimming.
pub fn canned_reply(query: &str) -> Option<&'static str> {
    let normalized = query.trim().to_lowercase();
    if GREETINGS.contains(&normalized.as_str()) {
        Some(GREETING_REPLY)
    } else if ACKNOWLEDGMENTS.contains(&normalized.as_str()) {
        Some(ACKNOWLEDGMENT_REPLY)
    } else {
        None
    }
}

/// Most recent system message carrying [`TRIAGE_RESULT_MARKER`].
pub fn find_last_triage(history: &[ConversationMessage]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|m| m.role == "system" && m.content.contains(TRIAGE_RESULT_MARKER))
        .map(|m| m.content.as_str())
}

/// The system prompt, with the triage context appended when known.
pub fn chat_system_prompt(triage_context: Option<&str>) -> String {
    match triage_context {
        Some(context) => {
            format!("{CHAT_SYSTEM_PROMPT}\n\nContext: The last triage result was:\n{context}")
        }
        None => CHAT_SYSTEM_PROMPT.to_string(),
    }
}

/// Answers follow-up questions about triage results.
#[derive(Clone)]
pub struct ChatResponder {
    model: Arc<dyn ChatModel>,
    history_window: usize,
}

impl ChatResponder {
    pub fn new(model: Arc<dyn ChatModel>, history_window: usize) -> Self {
        Self { model, history_window }
    }

    /// Reply to `query` given caller-owned `history`.
    ///
    /// `last_known_triage` takes precedence over a triage result found in
    /// the history.
    pub async fn respond(
        &self,
        history: &[ConversationMessage],
        query: &str,
        last_known_triage: Option<&str>,
    ) -> Result<String> {
        if let Some(reply) = canned_reply(query) {
            debug!("answered small talk without model call");
            return Ok(reply.to_string());
        }

        let context = last_known_triage
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| find_last_triage(history));

        let start = history.len().saturating_sub(self.history_window);
        let mut messages = Vec::with_capacity(history.len() - start + 2);
        messages.push(ChatMessage::system(chat_system_prompt(context)));
        messages.extend(
            history[start..].iter().map(|m| ChatMessage::new(m.role.clone(), m.content.clone())),
        );
        messages.push(ChatMessage::user(query));

        debug!(
            history_sent = history.len() - start,
            has_context = context.is_some(),
            "sending chat turn"
        );

        let request = ChatRequest::new(messages)
            .with_temperature(CHAT_TEMPERATURE)
            .with_max_tokens(CHAT_MAX_TOKENS);
        Ok(self.model.complete(request).await?)
    }
}
