//! # triage-pipeline
//!
//! The clinical triage core: analyze → retrieve → reason, plus follow-up chat.
//!
//! ## Overview
//!
//! - [`extract_json_object`] - recovers a JSON object from raw model output
//! - [`ReportAnalyzer`] - notes to [`AnalyzerResult`]
//! - [`GuidelineRetriever`] - facts to guideline snippets
//! - [`TriageReasoner`] - facts and snippets to [`TriageVerdict`]
//! - [`TriagePipeline`] - runs the three stages for one case
//! - [`ChatResponder`] - answers questions about a triage result
//!
//! Model content that cannot be read never fails a request: the analyzer
//! degrades to empty facts and the reasoner to [`TriageVerdict::safe_default`].
//! Failed calls surface as [`TriageError`].

pub mod analyzer;
pub mod chat;
pub mod config;
pub mod error;
pub mod json;
pub mod normalize;
pub mod orchestrator;
pub mod reasoner;
pub mod retriever;
pub mod types;

pub use analyzer::ReportAnalyzer;
pub use chat::{ChatResponder, canned_reply, find_last_triage};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{Result, TriageError};
pub use json::extract_json_object;
pub use orchestrator::{TriagePipeline, TriagePipelineBuilder, compose_raw_text};
pub use reasoner::{NO_GUIDELINES_SENTINEL, TriageReasoner, build_guideline_context};
pub use retriever::{GuidelineRetriever, Retrieval, build_retrieval_query};
pub use types::{
    AnalyzerResult, ConversationMessage, DebugBundle, TRIAGE_LEVELS, TriageOutcome, TriageVerdict,
};
