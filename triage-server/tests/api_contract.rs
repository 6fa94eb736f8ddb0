use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::routing::post;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use triage_model::MockChatModel;
use triage_pipeline::chat::GREETING_REPLY;
use triage_pipeline::{PipelineConfig, TRIAGE_LEVELS};
use triage_rag::{
    GuidelineCollection, GuidelineInput, HashingEmbeddingProvider, InMemoryVectorStore,
    prepare_guidelines,
};
use triage_server::handoff::HandoffClient;
use triage_server::{AppState, app_router};

const ANALYZER_REPLY: &str =
    r#"{"symptoms": ["chest pain", "shortness of breath"], "risk_factors": ["smoker"], "diagnoses": []}"#;
const REASONER_REPLY: &str = r#"Here is my assessment:
{"triage_level": "Level 2", "explanation": "Possible cardiac ischemia.", "recommendations": ["ECG now"]}"#;

async fn spawn(app: axum::Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn seeded_collection() -> Arc<GuidelineCollection> {
    let collection = GuidelineCollection::builder()
        .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .expect("collection");
    collection.ensure_exists().await.expect("ensure collection");

    let items: Vec<GuidelineInput> = [
        "Chest pain with shortness of breath: obtain ECG within 10 minutes.",
        "Minor laceration: clean and close, tetanus status check.",
    ]
    .iter()
    .map(|t| GuidelineInput { text: Some(t.to_string()), ..Default::default() })
    .collect();
    collection.add(&prepare_guidelines(&items)).await.expect("seed guidelines");
    Arc::new(collection)
}

async fn spawn_server(
    model: Arc<MockChatModel>,
    webhook_url: Option<String>,
) -> (String, tokio::task::JoinHandle<()>) {
    let handoff = HandoffClient::new(webhook_url, Duration::from_secs(5)).expect("handoff client");
    let state = AppState::new(model, seeded_collection().await, PipelineConfig::default(), handoff)
        .expect("app state");
    spawn(app_router(state)).await
}

fn error_code(body: &Value) -> &str {
    body.pointer("/error/code").and_then(Value::as_str).unwrap_or_default()
}

fn error_message(body: &Value) -> &str {
    body.pointer("/error/message").and_then(Value::as_str).unwrap_or_default()
}

#[tokio::test]
async fn liveness_routes_report_ok() {
    let (base, handle) = spawn_server(Arc::new(MockChatModel::new()), None).await;
    let client = reqwest::Client::new();

    for path in ["/", "/health"] {
        let resp = client.get(format!("{}{}", base, path)).send().await.expect("health response");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("health json");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "Clinical Triage API");
    }

    handle.abort();
}

#[tokio::test]
async fn triage_debug_returns_intermediate_artifacts() {
    let model = Arc::new(MockChatModel::new().with_reply(ANALYZER_REPLY).with_reply(REASONER_REPLY));
    let (base, handle) = spawn_server(model.clone(), None).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/triage", base))
        .json(&json!({
            "text": "58 year old smoker with chest pain",
            "report": "Onset 2 hours ago, shortness of breath on exertion.",
            "debug": true
        }))
        .send()
        .await
        .expect("triage response");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("triage json");
    assert_eq!(body["analyzer"]["symptoms"], json!(["chest pain", "shortness of breath"]));
    assert_eq!(body["analyzer"]["risk_factors"], json!(["smoker"]));
    let query = body["retrieval_query"].as_str().expect("retrieval_query");
    assert!(query.starts_with("symptoms: "), "query was {query:?}");
    assert_eq!(body["guideline_ids"].as_array().map(Vec::len), Some(2));

    let level = body["triage"]["triage_level"].as_str().expect("triage_level");
    assert!(TRIAGE_LEVELS.contains(&level));
    assert_eq!(body["triage"]["recommendations"], json!(["ECG now"]));
    assert_eq!(model.call_count(), 2);

    handle.abort();
}

#[tokio::test]
async fn triage_without_debug_returns_bare_verdict() {
    let model = Arc::new(MockChatModel::new().with_reply(ANALYZER_REPLY).with_reply(REASONER_REPLY));
    let (base, handle) = spawn_server(model, None).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/triage", base))
        .json(&json!({"text": "chest pain"}))
        .send()
        .await
        .expect("triage response")
        .json()
        .await
        .expect("triage json");

    assert_eq!(body["triage_level"], "Level 2");
    assert!(body.get("analyzer").is_none());

    handle.abort();
}

#[tokio::test]
async fn empty_triage_input_is_rejected_without_model_calls() {
    let model = Arc::new(MockChatModel::new());
    let (base, handle) = spawn_server(model.clone(), None).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/triage", base))
        .json(&json!({"text": "   ", "report": ""}))
        .send()
        .await
        .expect("triage response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_code(&body), "BAD_REQUEST");
    assert_eq!(error_message(&body), "No input text or report provided.");
    assert_eq!(model.call_count(), 0);

    handle.abort();
}

#[tokio::test]
async fn model_outage_maps_to_bad_gateway() {
    // Empty script and no fallback: every completion fails in transport.
    let (base, handle) = spawn_server(Arc::new(MockChatModel::new()), None).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/triage", base))
        .json(&json!({"text": "fever and cough"}))
        .send()
        .await
        .expect("triage response");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_code(&body), "UPSTREAM_ERROR");

    handle.abort();
}

#[tokio::test]
async fn text_upload_runs_the_pipeline() {
    let model = Arc::new(MockChatModel::new().with_reply(ANALYZER_REPLY).with_reply(REASONER_REPLY));
    let (base, handle) = spawn_server(model.clone(), None).await;

    let form = Form::new().part(
        "file",
        Part::bytes(b"Patient reports chest pain since this morning.".to_vec()).file_name("report.txt"),
    );
    let resp = reqwest::Client::new()
        .post(format!("{}/triage-upload?debug=true", base))
        .multipart(form)
        .send()
        .await
        .expect("upload response");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("upload json");
    assert_eq!(body["triage"]["triage_level"], "Level 2");
    let analyzer_prompt = &model.requests()[0];
    assert!(
        analyzer_prompt
            .messages
            .iter()
            .any(|m| m.content.contains("chest pain since this morning"))
    );

    handle.abort();
}

#[tokio::test]
async fn upload_errors_are_client_errors() {
    let model = Arc::new(MockChatModel::new());
    let (base, handle) = spawn_server(model.clone(), None).await;
    let client = reqwest::Client::new();

    let empty_pdf = Form::new().part("file", Part::bytes(Vec::new()).file_name("scan.pdf"));
    let resp = client
        .post(format!("{}/triage-upload", base))
        .multipart(empty_pdf)
        .send()
        .await
        .expect("upload response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_message(&body), "Empty PDF file.");

    let docx = Form::new().part("file", Part::bytes(b"PK".to_vec()).file_name("notes.docx"));
    let resp = client
        .post(format!("{}/triage-upload", base))
        .multipart(docx)
        .send()
        .await
        .expect("upload response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_message(&body), "Unsupported file type. Use .txt or .pdf");

    let no_file = Form::new().text("note", "nothing attached");
    let resp = client
        .post(format!("{}/triage-upload", base))
        .multipart(no_file)
        .send()
        .await
        .expect("upload response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_message(&body), "No file uploaded.");

    assert_eq!(model.call_count(), 0);
    handle.abort();
}

#[tokio::test]
async fn chat_small_talk_and_context() {
    let model = Arc::new(MockChatModel::new().with_reply("Level 2 means you should be seen soon."));
    let (base, handle) = spawn_server(model.clone(), None).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/chat", base))
        .json(&json!({"history": [], "query": "  Hello "}))
        .send()
        .await
        .expect("chat response")
        .json()
        .await
        .expect("chat json");
    assert_eq!(body["reply"], GREETING_REPLY);
    assert_eq!(model.call_count(), 0);

    let body: Value = client
        .post(format!("{}/chat", base))
        .json(&json!({
            "history": [
                {"role": "user", "content": "I have chest pain"},
                {"role": "assistant", "content": "Please run a triage first."}
            ],
            "query": "What does my level mean?",
            "triage": {"triage_level": "Level 2", "explanation": "Possible cardiac ischemia."}
        }))
        .send()
        .await
        .expect("chat response")
        .json()
        .await
        .expect("chat json");
    assert_eq!(body["reply"], "Level 2 means you should be seen soon.");

    let request = &model.requests()[0];
    assert_eq!(request.messages[0].role, "system");
    assert!(request.messages[0].content.contains("Level 2"));
    assert_eq!(
        request.messages.last().map(|m| m.content.as_str()),
        Some("What does my level mean?")
    );

    handle.abort();
}

#[tokio::test]
async fn ingest_guidelines_validates_and_counts() {
    let (base, handle) = spawn_server(Arc::new(MockChatModel::new()), None).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ingest-guidelines", base))
        .json(&json!({"items": []}))
        .send()
        .await
        .expect("ingest response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_message(&body), "No items provided.");

    let resp = client
        .post(format!("{}/ingest-guidelines", base))
        .json(&json!({"items": [{"text": ""}, {"id": "only-id"}]}))
        .send()
        .await
        .expect("ingest response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_message(&body), "No valid guideline texts.");

    let resp = client
        .post(format!("{}/ingest-guidelines", base))
        .json(&json!({"items": [
            {"id": "sepsis-01", "text": "Suspected sepsis: lactate and blood cultures.", "metadata": {"source": "local"}},
            {"text": "Stroke symptoms: note last known well time."},
            {"text": "   "}
        ]}))
        .send()
        .await
        .expect("ingest response");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("ingest json");
    assert_eq!(body["ingested"], 2);

    handle.abort();
}

#[tokio::test]
async fn handoff_forwards_to_webhook() {
    let received = Arc::new(tokio::sync::Mutex::new(None::<Value>));
    let sink = received.clone();
    let webhook = axum::Router::new().route(
        "/hook",
        post(move |Json(payload): Json<Value>| {
            let sink = sink.clone();
            async move {
                *sink.lock().await = Some(payload);
                Json(json!({"status": "queued", "ticket": 17}))
            }
        }),
    );
    let (hook_base, hook_handle) = spawn(webhook).await;

    let (base, handle) =
        spawn_server(Arc::new(MockChatModel::new()), Some(format!("{}/hook", hook_base))).await;

    let package = json!({
        "patient": {"name": "Jane Doe", "age": 58},
        "triage": {"triage_level": "Level 2"},
        "instruction": "Notify cardiology on-call."
    });
    let resp = reqwest::Client::new()
        .post(format!("{}/handoff-n8n", base))
        .json(&package)
        .send()
        .await
        .expect("handoff response");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("handoff json");
    assert_eq!(body, json!({"status": "queued", "ticket": 17}));
    assert_eq!(received.lock().await.clone(), Some(package));

    handle.abort();
    hook_handle.abort();
}

#[tokio::test]
async fn handoff_accepts_non_json_webhook_reply() {
    let webhook = axum::Router::new().route("/hook", post(|| async { "Workflow was started" }));
    let (hook_base, hook_handle) = spawn(webhook).await;
    let (base, handle) =
        spawn_server(Arc::new(MockChatModel::new()), Some(format!("{}/hook", hook_base))).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/handoff-n8n", base))
        .json(&json!({"patient": {}, "triage": {}, "instruction": "none"}))
        .send()
        .await
        .expect("handoff response")
        .json()
        .await
        .expect("handoff json");
    assert_eq!(body["status"], "ok");

    handle.abort();
    hook_handle.abort();
}

#[tokio::test]
async fn handoff_failures_are_reported() {
    let (base, handle) = spawn_server(Arc::new(MockChatModel::new()), None).await;
    let package = json!({"patient": {}, "triage": {}, "instruction": "none"});
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/handoff-n8n", base))
        .json(&package)
        .send()
        .await
        .expect("handoff response");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_code(&body), "CONFIG_ERROR");
    assert_eq!(error_message(&body), "Missing N8N_WEBHOOK_URL");
    handle.abort();

    let webhook = axum::Router::new().route(
        "/hook",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "workflow crashed") }),
    );
    let (hook_base, hook_handle) = spawn(webhook).await;
    let (base, handle) =
        spawn_server(Arc::new(MockChatModel::new()), Some(format!("{}/hook", hook_base))).await;

    let resp = client
        .post(format!("{}/handoff-n8n", base))
        .json(&package)
        .send()
        .await
        .expect("handoff response");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_message(&body), "n8n error: workflow crashed");

    handle.abort();
    hook_handle.abort();
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
    let model = Arc::new(MockChatModel::new());
    let (base, handle) = spawn_server(model.clone(), None).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/chat", base))
        .json(&json!({"history": []}))
        .send()
        .await
        .expect("chat response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_code(&body), "BAD_REQUEST");
    assert!(error_message(&body).contains("query"), "message was {:?}", error_message(&body));

    let resp = client
        .post(format!("{}/triage", base))
        .header("content-type", "application/json")
        .body("{\"text\": ")
        .send()
        .await
        .expect("triage response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_code(&body), "BAD_REQUEST");

    let resp = client
        .post(format!("{}/ingest-guidelines", base))
        .body("{}")
        .send()
        .await
        .expect("ingest response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_code(&body), "BAD_REQUEST");

    let form = Form::new().part("file", Part::bytes(b"fever".to_vec()).file_name("r.txt"));
    let resp = client
        .post(format!("{}/triage-upload?debug=maybe", base))
        .multipart(form)
        .send()
        .await
        .expect("upload response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_code(&body), "BAD_REQUEST");

    let resp = client
        .post(format!("{}/triage-upload", base))
        .body("not multipart")
        .send()
        .await
        .expect("upload response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error json");
    assert_eq!(error_code(&body), "BAD_REQUEST");

    assert_eq!(model.call_count(), 0);
    handle.abort();
}
