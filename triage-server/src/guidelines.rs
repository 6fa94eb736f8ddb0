//! Guideline ingestion shared by the HTTP endpoint and the startup preload.

use std::path::Path;

use serde_json::Value;
use tracing::{error, info, warn};
use triage_pipeline::{Result, TriageError};
use triage_rag::{GuidelineCollection, GuidelineInput, prepare_guidelines};

/// Validate and store `items`. Returns the number ingested.
///
/// # Errors
///
/// [`TriageError::Input`] when `items` is empty or none has usable text.
pub async fn ingest_items(collection: &GuidelineCollection, items: &[GuidelineInput]) -> Result<usize> {
    if items.is_empty() {
        return Err(TriageError::Input("No items provided.".to_string()));
    }
    let guidelines = prepare_guidelines(items);
    if guidelines.is_empty() {
        return Err(TriageError::Input("No valid guideline texts.".to_string()));
    }
    Ok(collection.add(&guidelines).await?)
}

/// Load the guideline file at `path` into `collection`.
///
/// Never fails: a missing file, non-array content or ingestion error is
/// logged and skipped. Returns the number ingested.
pub async fn preload_guidelines(collection: &GuidelineCollection, path: &Path) -> usize {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "no guideline file found, skipping preload");
            return 0;
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to read guideline file");
            return 0;
        }
    };

    let items = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!(path = %path.display(), "guideline file is not a list, skipping preload");
            return 0;
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "guideline file is not valid JSON");
            return 0;
        }
    };

    let items = match serde_json::from_value::<Vec<GuidelineInput>>(Value::Array(items)) {
        Ok(items) => items,
        Err(e) => {
            error!(path = %path.display(), error = %e, "malformed guideline item");
            return 0;
        }
    };

    let guidelines = prepare_guidelines(&items);
    if guidelines.is_empty() {
        return 0;
    }

    match collection.add(&guidelines).await {
        Ok(count) => {
            info!(path = %path.display(), count, "preloaded guidelines");
            count
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to preload guidelines");
            0
        }
    }
}
