//! Error types for the `triage-rag` crate.

use thiserror::Error;

/// Errors that can occur while storing or retrieving guidelines.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in collection orchestration (ingest or query).
    #[error("Collection error: {0}")]
    CollectionError(String),
}

/// A convenience result type for guideline operations.
pub type Result<T> = std::result::Result<T, RagError>;
