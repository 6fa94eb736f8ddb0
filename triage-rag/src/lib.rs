//! # triage-rag
//!
//! Guideline storage and similarity retrieval for the clinical triage assistant.
//!
//! ## Overview
//!
//! - [`EmbeddingProvider`] - turns text into vectors
//! - [`VectorStore`] - stores guideline records and searches them by similarity
//! - [`GuidelineCollection`] - one named collection: ensure, add, query
//! - [`prepare_guidelines`] - validates raw ingestion items and derives ids
//!
//! ## Features
//!
//! - `openai` (default) - [`OpenAIEmbeddingProvider`] for OpenAI-compatible APIs
//! - `qdrant` - [`qdrant::QdrantVectorStore`] for persistent storage
//! - `full` - everything
//!
//! [`InMemoryVectorStore`] and [`HashingEmbeddingProvider`] are always
//! available and need no network.

pub mod collection;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod inmemory;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use collection::{DEFAULT_COLLECTION_NAME, GuidelineCollection, GuidelineCollectionBuilder};
pub use document::{
    Guideline, GuidelineInput, GuidelineRecord, GuidelineSnippet, SearchResult,
    derive_guideline_id, prepare_guidelines,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use hashing::{DEFAULT_HASHING_DIMENSIONS, HashingEmbeddingProvider};
pub use inmemory::InMemoryVectorStore;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use vectorstore::VectorStore;
