use std::sync::Arc;

use triage_model::ChatModel;
use triage_pipeline::{ChatResponder, PipelineConfig, Result, TriagePipeline};
use triage_rag::GuidelineCollection;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::handoff::HandoffClient;
use crate::upload::UploadExtractor;

/// Shared handles for every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TriagePipeline>,
    pub chat: Arc<ChatResponder>,
    pub guidelines: Arc<GuidelineCollection>,
    pub handoff: Arc<HandoffClient>,
    pub uploads: Arc<UploadExtractor>,
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("collection", &self.guidelines.name())
            .field("handoff_configured", &self.handoff.is_configured())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the pipeline and chat responder around one model and collection.
    pub fn new(
        model: Arc<dyn ChatModel>,
        guidelines: Arc<GuidelineCollection>,
        config: PipelineConfig,
        handoff: HandoffClient,
    ) -> Result<Self> {
        let chat = ChatResponder::new(model.clone(), config.history_window);
        let pipeline = TriagePipeline::builder()
            .model(model)
            .collection(guidelines.clone())
            .config(config)
            .build()?;

        Ok(Self {
            pipeline: Arc::new(pipeline),
            chat: Arc::new(chat),
            guidelines,
            handoff: Arc::new(handoff),
            uploads: Arc::new(UploadExtractor::default()),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        })
    }

    pub fn with_uploads(mut self, uploads: UploadExtractor) -> Self {
        self.uploads = Arc::new(uploads);
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}
