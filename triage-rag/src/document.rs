//! Data types for guidelines, stored records and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest for derived ids.
pub const DERIVED_ID_LEN: usize = 16;

/// A guideline item as submitted for ingestion (HTTP body or startup file).
///
/// Every field is optional on the wire; items without usable text are skipped
/// by [`prepare_guidelines`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GuidelineInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// A validated guideline ready to be embedded and stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guideline {
    pub id: String,
    pub text: String,
    pub metadata: HashMap<String, String>,
}

/// A guideline as held by a vector store, with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuidelineRecord {
    pub id: String,
    pub text: String,
    /// Empty when returned by backends that do not echo vectors on search.
    pub embedding: Vec<f32>,
    pub metadata: HashMap<String, String>,
}

/// A retrieved [`GuidelineRecord`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub record: GuidelineRecord,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// The read-only view of a guideline handed to the reasoning pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuidelineSnippet {
    pub id: String,
    pub text: String,
}

impl From<GuidelineRecord> for GuidelineSnippet {
    fn from(record: GuidelineRecord) -> Self {
        Self { id: record.id, text: record.text }
    }
}

/// Derive a stable identifier from guideline text: the first 16 hex
/// characters of its SHA-256 digest.
pub fn derive_guideline_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(DERIVED_ID_LEN);
    id
}

/// Validate raw ingestion items.
///
/// Blank texts are skipped. Texts are trimmed; a missing or blank id is
/// replaced by [`derive_guideline_id`] of the trimmed text. Metadata values
/// that are not strings are kept as their JSON text.
pub fn prepare_guidelines(items: &[GuidelineInput]) -> Vec<Guideline> {
    items
        .iter()
        .filter_map(|item| {
            let text = item.text.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
            let id = item
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| derive_guideline_id(text));
            let metadata = item
                .metadata
                .as_ref()
                .map(|m| {
                    m.iter()
                        .map(|(k, v)| {
                            let value = match v {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            (k.clone(), value)
                        })
                        .collect()
                })
                .unwrap_or_default();
            Some(Guideline { id, text: text.to_string(), metadata })
        })
        .collect()
}
