//! Triage pipeline orchestrator.
//!
//! [`TriagePipeline`] runs Analyzer → Retriever → Reasoner strictly in
//! sequence for one case. The debug flag only changes the returned shape.
//!
//! # Example
//!
//! ```rust,ignore
//! let pipeline = TriagePipeline::builder()
//!     .model(Arc::new(model))
//!     .collection(Arc::new(collection))
//!     .config(PipelineConfig::default())
//!     .build()?;
//!
//! let outcome = pipeline.run_triage("persistent chest pain", true).await?;
//! ```

use std::sync::Arc;

use tracing::info;
use triage_model::ChatModel;
use triage_rag::GuidelineCollection;

use crate::analyzer::ReportAnalyzer;
use crate::config::PipelineConfig;
use crate::error::{Result, TriageError};
use crate::reasoner::TriageReasoner;
use crate::retriever::GuidelineRetriever;
use crate::types::{DebugBundle, TriageOutcome};

/// Message of the error raised for blank input.
pub const EMPTY_INPUT_MESSAGE: &str = "No input text or report provided.";

/// Join the free-text and report fields of a request into one input.
pub fn compose_raw_text(text: Option<&str>, report: Option<&str>) -> String {
    format!("{}\n{}", text.unwrap_or_default(), report.unwrap_or_default()).trim().to_string()
}

/// The analyze → retrieve → reason pipeline.
pub struct TriagePipeline {
    analyzer: ReportAnalyzer,
    retriever: GuidelineRetriever,
    reasoner: TriageReasoner,
    config: PipelineConfig,
}

impl TriagePipeline {
    /// Create a new [`TriagePipelineBuilder`].
    pub fn builder() -> TriagePipelineBuilder {
        TriagePipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Triage one case.
    ///
    /// # Errors
    ///
    /// [`TriageError::Input`] when `raw_text` is blank; otherwise whatever
    /// a failed model call or retrieval reports.
    pub async fn run_triage(&self, raw_text: &str, include_debug: bool) -> Result<TriageOutcome> {
        let raw_text = raw_text.trim();
        if raw_text.is_empty() {
            return Err(TriageError::Input(EMPTY_INPUT_MESSAGE.to_string()));
        }

        let analyzer = self.analyzer.analyze(raw_text).await?;
        let retrieval = self.retriever.retrieve(&analyzer, raw_text).await?;

        let texts: Vec<&str> = retrieval.snippets.iter().map(|s| s.text.as_str()).collect();
        let triage = self.reasoner.reason(&analyzer, &texts).await?;

        info!(
            triage_level = %triage.triage_level,
            guideline_count = retrieval.snippets.len(),
            debug = include_debug,
            "triage completed"
        );

        if !include_debug {
            return Ok(TriageOutcome::Verdict(triage));
        }

        let guideline_snippets = texts
            .iter()
            .take(self.config.debug_snippet_limit)
            .map(|s| s.to_string())
            .collect();
        let guideline_ids = retrieval.snippets.into_iter().map(|s| s.id).collect();

        Ok(TriageOutcome::Debug(Box::new(DebugBundle {
            triage,
            analyzer,
            retrieval_query: retrieval.query,
            guideline_ids,
            guideline_snippets,
        })))
    }
}

/// Builder for [`TriagePipeline`].
///
/// `model` and `collection` are required; `config` defaults to
/// [`PipelineConfig::default`].
#[derive(Default)]
pub struct TriagePipelineBuilder {
    model: Option<Arc<dyn ChatModel>>,
    collection: Option<Arc<GuidelineCollection>>,
    config: Option<PipelineConfig>,
}

impl TriagePipelineBuilder {
    /// Set the chat model used by both the analyzer and the reasoner.
    pub fn model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the guideline collection.
    pub fn collection(mut self, collection: Arc<GuidelineCollection>) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Config`] if a required field is missing.
    pub fn build(self) -> Result<TriagePipeline> {
        let model =
            self.model.ok_or_else(|| TriageError::Config("model is required".to_string()))?;
        let collection = self
            .collection
            .ok_or_else(|| TriageError::Config("collection is required".to_string()))?;
        let config = self.config.unwrap_or_default();

        Ok(TriagePipeline {
            analyzer: ReportAnalyzer::new(model.clone()),
            retriever: GuidelineRetriever::new(collection, config.top_k),
            reasoner: TriageReasoner::new(model),
            config,
        })
    }
}
