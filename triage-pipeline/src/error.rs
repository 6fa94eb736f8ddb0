//! Error taxonomy for the triage pipeline.

use thiserror::Error;
use triage_model::ModelError;
use triage_rag::RagError;

/// Errors surfaced by pipeline operations.
///
/// Unusable model *content* never shows up here; the analyzer and reasoner
/// absorb it into their safe defaults. Only failed calls propagate.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Missing or unusable caller input.
    #[error("{0}")]
    Input(String),

    /// An upstream call failed or answered with a non-success status.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Upstream answered with something that is not a valid response envelope.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Required configuration is missing.
    #[error("{0}")]
    Config(String),

    /// Guideline embedding or vector search failed.
    #[error("Retrieval error: {0}")]
    Retrieval(String),
}

impl From<ModelError> for TriageError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Request { .. } => TriageError::Upstream(err.to_string()),
            ModelError::Api { status, body, .. } => {
                TriageError::Upstream(format!("model returned {status}: {body}"))
            }
            ModelError::Parse { .. } => TriageError::Parse(err.to_string()),
            ModelError::Config(message) => TriageError::Config(message),
        }
    }
}

impl From<RagError> for TriageError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::ConfigError(message) => TriageError::Config(message),
            other => TriageError::Retrieval(other.to_string()),
        }
    }
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, TriageError>;
