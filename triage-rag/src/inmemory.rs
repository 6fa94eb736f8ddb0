//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps every collection in a `HashMap` behind a
//! `tokio::sync::RwLock`. Searches take the read lock, so concurrent queries
//! never block one another; only upserts are exclusive.
//!
//! A store built with [`InMemoryVectorStore::persistent`] mirrors each
//! collection to `<dir>/<name>.json` after every upsert and reloads it in
//! [`create_collection`](VectorStore::create_collection), so guidelines
//! survive a restart.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{GuidelineRecord, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are stored as nested maps: collection name → guideline id → record.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, HashMap<String, GuidelineRecord>>>,
    snapshot_dir: Option<PathBuf>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that snapshots every collection as JSON under `dir`.
    ///
    /// The directory is created on first use.
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self { collections: RwLock::default(), snapshot_dir: Some(dir.into()) }
    }

    pub fn snapshot_dir(&self) -> Option<&Path> {
        self.snapshot_dir.as_deref()
    }

    fn snapshot_path(&self, collection: &str) -> Result<Option<PathBuf>> {
        let Some(dir) = &self.snapshot_dir else {
            return Ok(None);
        };
        let valid = !collection.is_empty()
            && collection.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(RagError::CollectionError(format!(
                "collection name '{collection}' cannot be used as a snapshot file name"
            )));
        }
        Ok(Some(dir.join(format!("{collection}.json"))))
    }
}

fn missing(collection: &str) -> RagError {
    RagError::VectorStoreError {
        backend: BACKEND.to_string(),
        message: format!("collection '{collection}' does not exist"),
    }
}

fn snapshot_error(path: &Path, e: impl std::fmt::Display) -> RagError {
    RagError::VectorStoreError {
        backend: BACKEND.to_string(),
        message: format!("snapshot {}: {e}", path.display()),
    }
}

async fn load_snapshot(path: &Path) -> Result<HashMap<String, GuidelineRecord>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(snapshot_error(path, e)),
    };
    let records: Vec<GuidelineRecord> =
        serde_json::from_slice(&bytes).map_err(|e| snapshot_error(path, e))?;
    Ok(records.into_iter().map(|r| (r.id.clone(), r)).collect())
}

/// Write `records` sorted by id to a sibling temp file, then rename over `path`.
async fn write_snapshot(path: &Path, records: &HashMap<String, GuidelineRecord>) -> Result<()> {
    let mut sorted: Vec<&GuidelineRecord> = records.values().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));
    let json = serde_json::to_vec(&sorted).map_err(|e| snapshot_error(path, e))?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await.map_err(|e| snapshot_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| snapshot_error(path, e))?;
    debug!(path = %path.display(), records = sorted.len(), "wrote collection snapshot");
    Ok(())
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let snapshot = self.snapshot_path(name)?;
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Ok(());
        }

        let records = match (&snapshot, &self.snapshot_dir) {
            (Some(path), Some(dir)) => {
                tokio::fs::create_dir_all(dir).await.map_err(|e| snapshot_error(dir, e))?;
                let records = load_snapshot(path).await?;
                info!(path = %path.display(), records = records.len(), "opened collection snapshot");
                records
            }
            _ => HashMap::new(),
        };
        collections.insert(name.to_string(), records);
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: &[GuidelineRecord]) -> Result<()> {
        let snapshot = self.snapshot_path(collection)?;
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }

        // The write lock is held until the snapshot lands, so files are
        // written in upsert order.
        if let Some(path) = snapshot {
            write_snapshot(&path, store).await?;
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;

        let mut scored: Vec<SearchResult> = store
            .values()
            .map(|record| {
                let score = cosine_similarity(&record.embedding, embedding);
                SearchResult { record: record.clone(), score }
            })
            .collect();

        // Ties break on id so equal scores come back in a stable order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        collections.get(collection).map(HashMap::len).ok_or_else(|| missing(collection))
    }
}
