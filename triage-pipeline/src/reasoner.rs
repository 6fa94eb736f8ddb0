//! Second model call: facts plus guidelines to a triage verdict.

use std::sync::Arc;

use tracing::{debug, warn};
use triage_model::{ChatMessage, ChatModel, ChatRequest};

use crate::error::{Result, TriageError};
use crate::json::extract_json_object;
use crate::normalize::triage_verdict;
use crate::types::{AnalyzerResult, TriageVerdict};

pub const REASONER_SYSTEM_PROMPT: &str = "You are a clinical triage assistant. \
Return STRICT JSON (no markdown, no code fences). \
Keys:\n \
- triage_level (string; e.g., 'Level 1', 'Level 2', 'Level 3', 'Level 4', 'Level 5', or 'Unknown')\n \
- explanation (string; concise, grounded in facts/guidelines)\n \
- recommendations (array of short actionable strings)\n\
If no guidelines are available, infer a cautious triage level from facts; if insufficient, use 'Unknown'.";

/// Context line used when no guideline was retrieved.
pub const NO_GUIDELINES_SENTINEL: &str = "No relevant guidelines found.";

pub const REASONER_TEMPERATURE: f32 = 0.2;
pub const REASONER_MAX_TOKENS: u32 = 700;

/// Join snippets with blank lines, or return [`NO_GUIDELINES_SENTINEL`].
pub fn build_guideline_context<S: AsRef<str>>(snippets: &[S]) -> String {
    if snippets.is_empty() {
        return NO_GUIDELINES_SENTINEL.to_string();
    }
    snippets.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n\n")
}

/// Produces the final triage verdict.
#[derive(Clone)]
pub struct TriageReasoner {
    model: Arc<dyn ChatModel>,
}

impl TriageReasoner {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// The completion request sent for these facts and snippets.
    pub fn request<S: AsRef<str>>(analyzer: &AnalyzerResult, snippets: &[S]) -> Result<ChatRequest> {
        let facts = serde_json::to_string(analyzer)
            .map_err(|e| TriageError::Parse(format!("failed to serialize facts: {e}")))?;
        let context = build_guideline_context(snippets);

        Ok(ChatRequest::new(vec![
            ChatMessage::system(REASONER_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Structured patient facts:\n{facts}\n\nRetrieved guideline snippets:\n{context}\n\nReturn ONLY the JSON."
            )),
        ])
        .with_temperature(REASONER_TEMPERATURE)
        .with_max_tokens(REASONER_MAX_TOKENS)
        .with_json_response())
    }

    /// Reason over `analyzer` facts and guideline `snippets`.
    ///
    /// Unreadable model output yields [`TriageVerdict::safe_default`]; only a
    /// failed model call is an error.
    pub async fn reason<S: AsRef<str> + Sync>(
        &self,
        analyzer: &AnalyzerResult,
        snippets: &[S],
    ) -> Result<TriageVerdict> {
        let content = self.model.complete(Self::request(analyzer, snippets)?).await?;

        let verdict = match extract_json_object(&content) {
            Some(object) => triage_verdict(&object),
            None => {
                warn!(model = self.model.name(), "reasoner output held no JSON object");
                TriageVerdict::safe_default()
            }
        };

        debug!(triage_level = %verdict.triage_level, "reasoned verdict");
        Ok(verdict)
    }
}
