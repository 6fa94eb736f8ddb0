//! HTTP handlers.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use triage_pipeline::{ConversationMessage, TriageOutcome, compose_raw_text};
use triage_rag::GuidelineInput;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::guidelines::ingest_items;
use crate::handoff::HandoffRequest;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "Clinical Triage API";

#[derive(Debug, Deserialize)]
pub struct TriageRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub report: Option<String>,
    #[serde(default)]
    pub debug: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
    pub query: String,
    /// Last known triage result, as text or JSON.
    #[serde(default)]
    pub triage: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub items: Vec<GuidelineInput>,
}

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": SERVICE_NAME}))
}

pub async fn triage(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TriageRequest>,
) -> Result<Json<TriageOutcome>, ApiError> {
    let raw_text = compose_raw_text(request.text.as_deref(), request.report.as_deref());
    let outcome = state.pipeline.run_triage(&raw_text, request.debug.unwrap_or(false)).await?;
    Ok(Json(outcome))
}

pub async fn triage_upload(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TriageOutcome>, ApiError> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded.".to_string()))?;
    info!(filename = %filename, size = bytes.len(), "received upload");

    let raw_text = state.uploads.extract(&filename, bytes).await?;
    let outcome = state.pipeline.run_triage(&raw_text, params.debug).await?;
    Ok(Json(outcome))
}

pub async fn chat(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChatBody>,
) -> Result<Json<Value>, ApiError> {
    let last_triage = body.triage.as_ref().and_then(|value| match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    });

    let reply = state.chat.respond(&body.history, &body.query, last_triage.as_deref()).await?;
    Ok(Json(json!({"reply": reply})))
}

pub async fn ingest_guidelines(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<IngestRequest>,
) -> Result<Json<Value>, ApiError> {
    let ingested = ingest_items(&state.guidelines, &request.items).await?;
    Ok(Json(json!({"ingested": ingested})))
}

pub async fn handoff(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<HandoffRequest>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.handoff.forward(&request).await?))
}
