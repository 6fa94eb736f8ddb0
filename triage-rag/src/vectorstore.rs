//! Vector store trait for storing and searching guideline embeddings.

use async_trait::async_trait;

use crate::document::{GuidelineRecord, SearchResult};
use crate::error::Result;

/// A storage backend for guideline embeddings with similarity search.
///
/// Implementations manage named collections of [`GuidelineRecord`]s. Upserts
/// are keyed by record id, so re-adding a guideline replaces it in place.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Insert or replace records in a collection. Records must have embeddings set.
    async fn upsert(&self, collection: &str, records: &[GuidelineRecord]) -> Result<()>;

    /// Search for the `top_k` most similar records to the given embedding.
    ///
    /// Returns results ordered by descending similarity score.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of records held by a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}
