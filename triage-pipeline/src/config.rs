//! Tunables for the triage pipeline and chat responder.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Number of guidelines fetched per triage.
    pub top_k: usize,
    /// Maximum snippet texts included in a debug bundle.
    pub debug_snippet_limit: usize,
    /// Number of trailing history messages replayed to the chat model.
    pub history_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { top_k: 5, debug_snippet_limit: 3, history_window: 12 }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn debug_snippet_limit(mut self, limit: usize) -> Self {
        self.config.debug_snippet_limit = limit;
        self
    }

    pub fn history_window(mut self, window: usize) -> Self {
        self.config.history_window = window;
        self
    }

    /// Build the [`PipelineConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Config`] if `top_k == 0`.
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.top_k == 0 {
            return Err(TriageError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config, PipelineConfig { top_k: 5, debug_snippet_limit: 3, history_window: 12 });
    }

    #[test]
    fn zero_top_k_is_rejected() {
        assert!(matches!(
            PipelineConfig::builder().top_k(0).build(),
            Err(TriageError::Config(_))
        ));
    }
}
