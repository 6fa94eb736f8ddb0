//! Forwarding a completed triage package to an n8n webhook.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};
use triage_pipeline::{Result, TriageError};

/// Reply used when the webhook answers with a body that is not JSON.
pub const HANDOFF_ACK_MESSAGE: &str = "Handoff sent to n8n.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandoffRequest {
    pub patient: Value,
    pub triage: Value,
    pub instruction: String,
}

/// Posts handoff packages to the configured webhook.
#[derive(Debug, Clone)]
pub struct HandoffClient {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl HandoffClient {
    /// Create a client. Without a URL every call fails with a config error.
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TriageError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, webhook_url })
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Send `request` and return the webhook's JSON reply.
    pub async fn forward(&self, request: &HandoffRequest) -> Result<Value> {
        let url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| TriageError::Config("Missing N8N_WEBHOOK_URL".to_string()))?;

        let response = self.client.post(url).json(request).send().await.map_err(|e| {
            error!(error = %e, "handoff request failed");
            TriageError::Upstream(format!("Error calling n8n: {e}"))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TriageError::Upstream(format!("Error calling n8n: {e}")))?;

        if !status.is_success() {
            error!(%status, "n8n webhook returned an error");
            return Err(TriageError::Upstream(format!("n8n error: {body}")));
        }

        info!(%status, "handoff delivered");
        Ok(serde_json::from_str(&body)
            .unwrap_or_else(|_| json!({"status": "ok", "message": HANDOFF_ACK_MESSAGE})))
    }
}
