//! Environment configuration.
//!
//! `.env` is loaded by the binary before [`TriageConfig::from_env`] runs.
//! Only `GROQ_API_KEY` is required; everything else has a default or is
//! optional.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use triage_model::{GROQ_API_BASE, GROQ_DEFAULT_MODEL};
use triage_rag::DEFAULT_COLLECTION_NAME;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_GUIDELINES_FILE: &str = "guidelines.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_VECTOR_STORE_DIR: &str = "guideline_store";
pub const DEFAULT_OCR_LANGUAGES: &str = "eng";
pub const DEFAULT_OCR_RENDER_DPI: u32 = 200;

/// `VECTOR_STORE_DIR` value that keeps the local store in memory only.
const NO_PERSISTENCE: &str = "none";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} in environment (.env).")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Remote embedding endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSettings {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: Option<usize>,
}

/// Page OCR for scanned PDFs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrSettings {
    pub tessdata_dir: PathBuf,
    pub languages: String,
    pub render_dpi: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageConfig {
    pub groq_api_key: String,
    pub groq_api_base: String,
    pub groq_model: String,
    pub n8n_webhook_url: Option<String>,
    pub guidelines_file: PathBuf,
    pub guideline_collection: String,
    pub qdrant_url: Option<String>,
    /// Snapshot directory of the local store. `None` keeps it in memory only.
    pub vector_store_dir: Option<PathBuf>,
    /// `None` leaves scanned pages unrecognized.
    pub ocr: Option<OcrSettings>,
    /// `None` selects the local hashing embedder.
    pub embedding: Option<EmbeddingSettings>,
    pub host: String,
    pub port: u16,
    pub http_timeout: Duration,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

impl TriageConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let groq_api_key = get("GROQ_API_KEY").ok_or(ConfigError::Missing("GROQ_API_KEY"))?;

        let embedding = match get("EMBEDDING_API_BASE") {
            Some(api_base) => Some(EmbeddingSettings {
                api_base,
                api_key: get("EMBEDDING_API_KEY")
                    .ok_or(ConfigError::Missing("EMBEDDING_API_KEY"))?,
                model: get("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.into()),
                dimensions: parse_opt(&get, "EMBEDDING_DIMENSIONS")?,
            }),
            None => None,
        };

        let ocr = match get("OCR_TESSDATA_DIR") {
            Some(dir) => Some(OcrSettings {
                tessdata_dir: dir.into(),
                languages: get("OCR_LANGUAGES").unwrap_or_else(|| DEFAULT_OCR_LANGUAGES.into()),
                render_dpi: parse_opt(&get, "OCR_RENDER_DPI")?.unwrap_or(DEFAULT_OCR_RENDER_DPI),
            }),
            None => None,
        };

        let vector_store_dir: Option<PathBuf> = match get("VECTOR_STORE_DIR") {
            Some(dir) if dir.eq_ignore_ascii_case(NO_PERSISTENCE) => None,
            Some(dir) => Some(dir.into()),
            None => Some(DEFAULT_VECTOR_STORE_DIR.into()),
        };

        let log_format = match get("LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
            None | Some("text") | Some("pretty") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid { key: "LOG_FORMAT", value: other.to_string() });
            }
        };

        Ok(Self {
            groq_api_key,
            groq_api_base: get("GROQ_API_BASE").unwrap_or_else(|| GROQ_API_BASE.into()),
            groq_model: get("GROQ_MODEL").unwrap_or_else(|| GROQ_DEFAULT_MODEL.into()),
            n8n_webhook_url: get("N8N_WEBHOOK_URL"),
            guidelines_file: get("GUIDELINES_FILE")
                .unwrap_or_else(|| DEFAULT_GUIDELINES_FILE.into())
                .into(),
            guideline_collection: get("GUIDELINE_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.into()),
            qdrant_url: get("QDRANT_URL"),
            vector_store_dir,
            ocr,
            embedding,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port: parse_opt(&get, "PORT")?.unwrap_or(DEFAULT_PORT),
            http_timeout: Duration::from_secs(
                parse_opt(&get, "HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            max_upload_bytes: parse_opt(&get, "MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            log_format,
        })
    }
}

fn parse_opt<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| value.parse().map_err(|_| ConfigError::Invalid { key, value: value.clone() }))
        .transpose()
}
