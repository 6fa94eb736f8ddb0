//! Typed shapes flowing through the pipeline.

use serde::{Deserialize, Serialize};

/// Verdict level used whenever the model gives none.
pub const UNKNOWN_LEVEL: &str = "Unknown";

/// Conventional triage levels, most to least urgent, plus [`UNKNOWN_LEVEL`].
pub const TRIAGE_LEVELS: [&str; 6] =
    ["Level 1", "Level 2", "Level 3", "Level 4", "Level 5", UNKNOWN_LEVEL];

/// Explanation used when the model omits one.
pub const FALLBACK_EXPLANATION: &str = "No explanation provided.";

/// Explanation of the safe-default verdict.
pub const UNPARSEABLE_EXPLANATION: &str = "Unable to parse model output into JSON.";

/// The single recommendation of the safe-default verdict.
pub const CONSULT_RECOMMENDATION: &str =
    "Consult a healthcare professional for further evaluation and guidance.";

/// Structured clinical facts extracted from free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyzerResult {
    pub symptoms: Vec<String>,
    pub risk_factors: Vec<String>,
    pub diagnoses: Vec<String>,
}

impl AnalyzerResult {
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty() && self.risk_factors.is_empty() && self.diagnoses.is_empty()
    }
}

/// The final triage decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriageVerdict {
    pub triage_level: String,
    pub explanation: String,
    pub recommendations: Vec<String>,
}

impl TriageVerdict {
    /// Returned when the model's output cannot be read as JSON at all.
    pub fn safe_default() -> Self {
        Self {
            triage_level: UNKNOWN_LEVEL.to_string(),
            explanation: UNPARSEABLE_EXPLANATION.to_string(),
            recommendations: vec![CONSULT_RECOMMENDATION.to_string()],
        }
    }
}

/// Verdict plus the intermediate artifacts that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugBundle {
    pub triage: TriageVerdict,
    pub analyzer: AnalyzerResult,
    pub retrieval_query: String,
    pub guideline_ids: Vec<String>,
    pub guideline_snippets: Vec<String>,
}

/// What [`run_triage`](crate::TriagePipeline::run_triage) returns.
///
/// Serializes untagged: either the bare verdict or the debug bundle.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TriageOutcome {
    Verdict(TriageVerdict),
    Debug(Box<DebugBundle>),
}

impl TriageOutcome {
    pub fn verdict(&self) -> &TriageVerdict {
        match self {
            TriageOutcome::Verdict(verdict) => verdict,
            TriageOutcome::Debug(bundle) => &bundle.triage,
        }
    }
}

/// One turn of caller-owned chat history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }
}
