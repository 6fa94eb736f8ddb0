//! API error type with structured JSON responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use triage_pipeline::TriageError;
use triage_rag::RagError;

use crate::upload::UploadError;

/// Error response body: `{"error": {"code", "message"}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Handler errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Unreadable upstream response: {0}")]
    UpstreamParse(String),
    #[error("Retrieval failed: {0}")]
    Retrieval(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::UpstreamParse(_) | ApiError::Retrieval(_) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::UpstreamParse(_) => "UPSTREAM_PARSE_ERROR",
            ApiError::Retrieval(_) => "RETRIEVAL_ERROR",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Upstream(m)
            | ApiError::UpstreamParse(m)
            | ApiError::Retrieval(m)
            | ApiError::Config(m)
            | ApiError::Internal(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail { code: self.code(), message: self.message().to_string() },
        };
        (status, Json(body)).into_response()
    }
}

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        match err {
            TriageError::Input(m) => ApiError::BadRequest(m),
            TriageError::Upstream(m) => ApiError::Upstream(m),
            TriageError::Parse(m) => ApiError::UpstreamParse(m),
            TriageError::Config(m) => ApiError::Config(m),
            TriageError::Retrieval(m) => ApiError::Retrieval(m),
        }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        TriageError::from(err).into()
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Extraction(_) | UploadError::Ocr(_) => ApiError::Internal(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}
