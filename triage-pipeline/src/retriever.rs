//! Guideline lookup driven by analyzer facts.

use std::sync::Arc;

use tracing::debug;
use triage_rag::{GuidelineCollection, GuidelineSnippet};

use crate::error::Result;
use crate::types::AnalyzerResult;

/// The query sent to the collection and what came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    pub query: String,
    pub snippets: Vec<GuidelineSnippet>,
}

/// Build the similarity query from analyzer facts.
///
/// Non-empty fields appear in the order symptoms, risk_factors, diagnoses as
/// `"symptoms: a, b | risk_factors: c | diagnoses: d"`. When every field is
/// empty the fallback text is used as is.
pub fn build_retrieval_query(analyzer: &AnalyzerResult, fallback_text: &str) -> String {
    let parts: Vec<String> = [
        ("symptoms", &analyzer.symptoms),
        ("risk_factors", &analyzer.risk_factors),
        ("diagnoses", &analyzer.diagnoses),
    ]
    .into_iter()
    .filter(|(_, values)| !values.is_empty())
    .map(|(label, values)| format!("{label}: {}", values.join(", ")))
    .collect();

    let query = parts.join(" | ");
    let query = query.trim();
    if query.is_empty() { fallback_text.to_string() } else { query.to_string() }
}

/// Fetches the guidelines most relevant to a case.
#[derive(Clone)]
pub struct GuidelineRetriever {
    collection: Arc<GuidelineCollection>,
    top_k: usize,
}

impl GuidelineRetriever {
    pub fn new(collection: Arc<GuidelineCollection>, top_k: usize) -> Self {
        Self { collection, top_k }
    }

    /// Query the collection for up to `top_k` guidelines.
    ///
    /// Blank documents are dropped; the store's relevance order is kept.
    pub async fn retrieve(&self, analyzer: &AnalyzerResult, fallback_text: &str) -> Result<Retrieval> {
        let query = build_retrieval_query(analyzer, fallback_text);
        let results = self.collection.query(&query, self.top_k).await?;

        let snippets: Vec<GuidelineSnippet> = results
            .into_iter()
            .filter(|hit| !hit.record.text.trim().is_empty())
            .map(|hit| GuidelineSnippet::from(hit.record))
            .collect();

        debug!(query = %query, snippet_count = snippets.len(), "retrieved guidelines");
        Ok(Retrieval { query, snippets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(symptoms: &[&str], risk_factors: &[&str], diagnoses: &[&str]) -> AnalyzerResult {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        AnalyzerResult {
            symptoms: owned(symptoms),
            risk_factors: owned(risk_factors),
            diagnoses: owned(diagnoses),
        }
    }

    #[test]
    fn query_skips_empty_fields() {
        let query = build_retrieval_query(&facts(&["fever"], &[], &["flu"]), "raw");
        assert_eq!(query, "symptoms: fever | diagnoses: flu");
    }

    #[test]
    fn query_joins_values_with_commas() {
        let query = build_retrieval_query(
            &facts(&["chest pain", "sweating"], &["smoker"], &[]),
            "raw",
        );
        assert_eq!(query, "symptoms: chest pain, sweating | risk_factors: smoker");
    }

    #[test]
    fn empty_facts_fall_back_to_raw_text() {
        let query = build_retrieval_query(&AnalyzerResult::default(), "persistent chest pain");
        assert_eq!(query, "persistent chest pain");
    }
}
