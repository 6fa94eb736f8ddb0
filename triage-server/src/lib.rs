//! # triage-server
//!
//! axum HTTP surface for the clinical triage assistant.
//!
//! | Route | Purpose |
//! |---|---|
//! | `POST /triage` | triage free text (`text`, `report`, `debug`) |
//! | `POST /triage-upload` | triage an uploaded `.txt` or `.pdf` |
//! | `POST /chat` | follow-up questions about a result |
//! | `POST /ingest-guidelines` | add guidelines to the collection |
//! | `POST /handoff-n8n` | forward a triage package to n8n |
//! | `GET /`, `GET /health` | liveness |

pub mod config;
pub mod error;
pub mod extract;
pub mod guidelines;
pub mod handoff;
pub mod ocr;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;
pub mod upload;

pub use config::TriageConfig;
pub use error::ApiError;
pub use server::{app_router, build_state, run_server};
pub use state::AppState;
