//! The guideline collection: one named vector-store collection plus the
//! embedder that feeds it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage_rag::{GuidelineCollection, HashingEmbeddingProvider, InMemoryVectorStore};
//!
//! let collection = GuidelineCollection::builder()
//!     .name("guidelines")
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! collection.ensure_exists().await?;
//! collection.add(&guidelines).await?;
//! let hits = collection.query("chest pain", 5).await?;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::{Guideline, GuidelineRecord, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Default collection name.
pub const DEFAULT_COLLECTION_NAME: &str = "guidelines";

/// A named guideline collection.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and the
/// underlying store handles its own locking.
pub struct GuidelineCollection {
    name: String,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl GuidelineCollection {
    /// Create a new [`GuidelineCollectionBuilder`].
    pub fn builder() -> GuidelineCollectionBuilder {
        GuidelineCollectionBuilder::default()
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the collection if missing. Safe to call repeatedly.
    pub async fn ensure_exists(&self) -> Result<()> {
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(&self.name, dimensions).await.map_err(|e| {
            error!(collection = %self.name, error = %e, "failed to create collection");
            RagError::CollectionError(format!("failed to create collection '{}': {e}", self.name))
        })
    }

    /// Embed and upsert guidelines, keyed by id. Returns the number stored.
    pub async fn add(&self, guidelines: &[Guideline]) -> Result<usize> {
        if guidelines.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = guidelines.iter().map(|g| g.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(collection = %self.name, error = %e, "embedding failed during ingestion");
            RagError::CollectionError(format!("embedding failed: {e}"))
        })?;

        if embeddings.len() != guidelines.len() {
            return Err(RagError::CollectionError(format!(
                "expected {} embeddings, got {}",
                guidelines.len(),
                embeddings.len()
            )));
        }

        let records: Vec<GuidelineRecord> = guidelines
            .iter()
            .zip(embeddings)
            .map(|(g, embedding)| GuidelineRecord {
                id: g.id.clone(),
                text: g.text.clone(),
                embedding,
                metadata: g.metadata.clone(),
            })
            .collect();

        self.vector_store.upsert(&self.name, &records).await.map_err(|e| {
            error!(collection = %self.name, error = %e, "upsert failed during ingestion");
            RagError::CollectionError(format!("upsert failed: {e}"))
        })?;

        info!(collection = %self.name, count = records.len(), "ingested guidelines");
        Ok(records.len())
    }

    /// Return up to `n_results` guidelines, most relevant first.
    pub async fn query(&self, text: &str, n_results: usize) -> Result<Vec<SearchResult>> {
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedding_provider.embed(text).await.map_err(|e| {
            error!(collection = %self.name, error = %e, "embedding failed during query");
            RagError::CollectionError(format!("query embedding failed: {e}"))
        })?;

        let results =
            self.vector_store.search(&self.name, &embedding, n_results).await.map_err(|e| {
                error!(collection = %self.name, error = %e, "search failed during query");
                RagError::CollectionError(format!("search failed: {e}"))
            })?;

        debug!(collection = %self.name, result_count = results.len(), "query completed");
        Ok(results)
    }

    /// Number of stored guidelines.
    pub async fn count(&self) -> Result<usize> {
        self.vector_store.count(&self.name).await
    }
}

/// Builder for [`GuidelineCollection`].
///
/// The embedder and store are required; the name defaults to
/// [`DEFAULT_COLLECTION_NAME`].
#[derive(Default)]
pub struct GuidelineCollectionBuilder {
    name: Option<String>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
}

impl GuidelineCollectionBuilder {
    /// Set the collection name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Build the collection.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or
    /// the name is blank.
    pub fn build(self) -> Result<GuidelineCollection> {
        let name = self.name.unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string());
        if name.trim().is_empty() {
            return Err(RagError::ConfigError("collection name must not be empty".to_string()));
        }
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;

        Ok(GuidelineCollection { name, embedding_provider, vector_store })
    }
}
