//! First model call: free text to structured clinical facts.

use std::sync::Arc;

use tracing::{debug, warn};
use triage_model::{ChatMessage, ChatModel, ChatRequest};

use crate::error::Result;
use crate::json::extract_json_object;
use crate::normalize::analyzer_result;
use crate::types::AnalyzerResult;

pub const ANALYZER_SYSTEM_PROMPT: &str = "You are a medical report analyzer. \
Return ONLY a valid JSON object (no markdown, no code fences) with keys:\n\
symptoms (array of short phrases), risk_factors (array), diagnoses (array).";

pub const ANALYZER_TEMPERATURE: f32 = 0.1;
pub const ANALYZER_MAX_TOKENS: u32 = 400;

/// Extracts symptoms, risk factors and diagnoses from clinical notes.
#[derive(Clone)]
pub struct ReportAnalyzer {
    model: Arc<dyn ChatModel>,
}

impl ReportAnalyzer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// The completion request sent for `raw_text`.
    pub fn request(raw_text: &str) -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system(ANALYZER_SYSTEM_PROMPT),
            ChatMessage::user(format!("Report / Notes:\n{raw_text}")),
        ])
        .with_temperature(ANALYZER_TEMPERATURE)
        .with_max_tokens(ANALYZER_MAX_TOKENS)
        .with_json_response()
    }

    /// Analyze `raw_text`.
    ///
    /// A failed model call is returned as an error. Output that holds no
    /// recoverable JSON object degrades to the empty result.
    pub async fn analyze(&self, raw_text: &str) -> Result<AnalyzerResult> {
        let content = self.model.complete(Self::request(raw_text)).await?;

        let object = extract_json_object(&content);
        if object.is_none() {
            warn!(model = self.model.name(), "analyzer output held no JSON object");
        }

        let result = analyzer_result(object.as_ref());
        debug!(
            symptoms = result.symptoms.len(),
            risk_factors = result.risk_factors.len(),
            diagnoses = result.diagnoses.len(),
            "analyzed report"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_model::{MockChatModel, ModelError};

    use crate::error::TriageError;

    #[tokio::test]
    async fn normalizes_model_output() {
        let model = Arc::new(MockChatModel::new().with_reply(
            r#"{"symptoms": "chest pain", "risk_factors": ["smoker", ""], "diagnoses": null}"#,
        ));
        let analyzer = ReportAnalyzer::new(model.clone());

        let result = analyzer.analyze("58M smoker with chest pain").await.unwrap();
        assert_eq!(result.symptoms, vec!["chest pain"]);
        assert_eq!(result.risk_factors, vec!["smoker"]);
        assert!(result.diagnoses.is_empty());

        let sent = &model.requests()[0];
        assert!(sent.json_response);
        assert_eq!(sent.max_tokens, ANALYZER_MAX_TOKENS);
        assert_eq!(sent.messages[1].content, "Report / Notes:\n58M smoker with chest pain");
    }

    #[tokio::test]
    async fn garbage_output_degrades_to_empty() {
        let model = Arc::new(MockChatModel::new().with_reply("I am not able to read this."));
        let result = ReportAnalyzer::new(model).analyze("notes").await.unwrap();
        assert_eq!(result, AnalyzerResult::default());
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let model = Arc::new(MockChatModel::new().with_error(ModelError::Api {
            provider: "Groq".into(),
            status: 500,
            body: "boom".into(),
        }));
        let err = ReportAnalyzer::new(model).analyze("notes").await.unwrap_err();
        assert!(matches!(err, TriageError::Upstream(_)));
    }
}
