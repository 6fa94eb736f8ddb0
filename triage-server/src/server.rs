use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use triage_model::{OpenAICompatibleClient, OpenAICompatibleConfig};
use triage_pipeline::PipelineConfig;
use triage_rag::{
    EmbeddingProvider, GuidelineCollection, HashingEmbeddingProvider, InMemoryVectorStore,
    OpenAIEmbeddingProvider, VectorStore,
};

use crate::config::{OcrSettings, TriageConfig};
use crate::guidelines::preload_guidelines;
use crate::handoff::HandoffClient;
use crate::routes;
use crate::state::AppState;
use crate::upload::{OcrEngine, PdfTextExtractor, UploadExtractor};

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/", get(routes::health))
        .route("/health", get(routes::health))
        .route("/triage", post(routes::triage))
        .route("/triage-upload", post(routes::triage_upload))
        .route("/chat", post(routes::chat))
        .route("/ingest-guidelines", post(routes::ingest_guidelines))
        .route("/handoff-n8n", post(routes::handoff))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn embedding_provider(config: &TriageConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let Some(settings) = &config.embedding else {
        info!("EMBEDDING_API_BASE not set, using local hashing embeddings");
        return Ok(Arc::new(HashingEmbeddingProvider::default()));
    };

    let mut provider = OpenAIEmbeddingProvider::new(settings.api_key.clone())?
        .with_base_url(settings.api_base.clone())
        .with_model(settings.model.clone())
        .with_timeout(config.http_timeout)?;
    if let Some(dimensions) = settings.dimensions {
        provider = provider.with_dimensions(dimensions);
    }
    info!(base = %settings.api_base, model = %settings.model, "using remote embeddings");
    Ok(Arc::new(provider))
}

fn vector_store(config: &TriageConfig) -> anyhow::Result<Arc<dyn VectorStore>> {
    match &config.qdrant_url {
        None => match &config.vector_store_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "using local vector store with disk snapshots");
                Ok(Arc::new(InMemoryVectorStore::persistent(dir)))
            }
            None => {
                warn!("VECTOR_STORE_DIR=none, guidelines are kept in memory only");
                Ok(Arc::new(InMemoryVectorStore::new()))
            }
        },
        #[cfg(feature = "qdrant")]
        Some(url) => {
            info!(url = %url, "using qdrant vector store");
            Ok(Arc::new(triage_rag::qdrant::QdrantVectorStore::new(url)?))
        }
        #[cfg(not(feature = "qdrant"))]
        Some(_) => anyhow::bail!("QDRANT_URL is set but this build lacks the `qdrant` feature"),
    }
}

fn upload_extractor(config: &TriageConfig) -> anyhow::Result<UploadExtractor> {
    let Some(settings) = &config.ocr else {
        info!("OCR_TESSDATA_DIR not set, scanned PDF pages will be skipped");
        return Ok(UploadExtractor::default());
    };
    Ok(UploadExtractor::new(Arc::new(PdfTextExtractor), ocr_engine(settings)?))
}

#[cfg(feature = "ocr")]
fn ocr_engine(settings: &OcrSettings) -> anyhow::Result<Arc<dyn OcrEngine>> {
    use crate::ocr::{PdfiumRenderer, RasterOcr, TesseractRecognizer};

    let recognizer = TesseractRecognizer::new(&settings.tessdata_dir, &settings.languages)?;
    let renderer = PdfiumRenderer::new()?;
    info!(
        tessdata = %settings.tessdata_dir.display(),
        languages = %settings.languages,
        dpi = settings.render_dpi,
        "using PDFium + Tesseract OCR"
    );
    Ok(Arc::new(
        RasterOcr::new(Arc::new(renderer), Arc::new(recognizer)).with_dpi(settings.render_dpi),
    ))
}

#[cfg(not(feature = "ocr"))]
fn ocr_engine(_settings: &OcrSettings) -> anyhow::Result<Arc<dyn OcrEngine>> {
    anyhow::bail!("OCR_TESSDATA_DIR is set but this build lacks the `ocr` feature")
}

/// Build the shared state from configuration and open the guideline collection.
pub async fn build_state(config: &TriageConfig) -> anyhow::Result<AppState> {
    let model = OpenAICompatibleClient::new(
        OpenAICompatibleConfig::groq(config.groq_api_key.clone())
            .with_base_url(config.groq_api_base.clone())
            .with_model(config.groq_model.clone())
            .with_timeout(config.http_timeout),
    )?;

    let collection = GuidelineCollection::builder()
        .name(config.guideline_collection.clone())
        .embedding_provider(embedding_provider(config)?)
        .vector_store(vector_store(config)?)
        .build()?;
    collection.ensure_exists().await.context("failed to open guideline collection")?;

    let uploads = upload_extractor(config)?;
    let handoff = HandoffClient::new(config.n8n_webhook_url.clone(), config.http_timeout)?;
    if !handoff.is_configured() {
        warn!("N8N_WEBHOOK_URL not set, /handoff-n8n will fail");
    }

    let state = AppState::new(Arc::new(model), Arc::new(collection), PipelineConfig::default(), handoff)?
        .with_uploads(uploads)
        .with_max_upload_bytes(config.max_upload_bytes);
    Ok(state)
}

pub async fn run_server(config: TriageConfig) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    preload_guidelines(&state.guidelines, &config.guidelines_file).await;

    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for triage-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("triage-server listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("triage-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
