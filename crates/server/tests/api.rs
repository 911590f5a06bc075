//! HTTP contract tests: spawn the router on an ephemeral port and drive it
//! with reqwest.

use async_trait::async_trait;
use docqa_core::config::{IngestConfig, RetrievalConfig};
use docqa_core::{AppError, AppResult};
use docqa_knowledge::embeddings::providers::TrigramProvider;
use docqa_knowledge::{AnswerSettings, KnowledgeBase, KnowledgeBaseParts};
use docqa_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_server::{app_router, AppState};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

struct StubLlm {
    fail: bool,
}

#[async_trait]
impl LlmClient for StubLlm {
    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-1"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if self.fail {
            return Err(AppError::Generation("upstream timed out".to_string()));
        }
        Ok(LlmResponse {
            content: format!("answer ({} prompt chars)", request.prompt.len()),
            model: "stub-1".to_string(),
            usage: LlmUsage::default(),
        })
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
    _dir: TempDir,
}

impl TestServer {
    async fn start(fail_llm: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let parts = KnowledgeBaseParts {
            ingest: IngestConfig {
                chunk_size: 200,
                chunk_overlap: 40,
                max_file_size: 64 * 1024,
            },
            retrieval: RetrievalConfig {
                snippet_length: 40,
                ..Default::default()
            },
            answer: AnswerSettings::default(),
            embedder: Arc::new(TrigramProvider::new(256)),
            llm: Arc::new(StubLlm { fail: fail_llm }),
            prompt: docqa_prompt::default_prompt().unwrap(),
        };
        let kb = KnowledgeBase::from_parts(parts, dir.path()).await.unwrap();
        let app = app_router(AppState::new(Arc::new(kb)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            handle,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> reqwest::Response {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()));
        self.client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

const GUIDE: &str = "The espresso machine needs descaling every two months. \
Use citric acid dissolved in warm water and run it through the steam wand. \
The grinder burrs should be cleaned weekly with a dry brush.";

#[tokio::test]
async fn test_health_and_ui() {
    let server = TestServer::start(false).await;

    let health: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["timestamp"].as_str().is_some());

    let page = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("<title>docqa</title>"));

    let info: Value = server
        .client
        .get(server.url("/info"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["status"], "active");
}

#[tokio::test]
async fn test_upload_then_query() {
    let server = TestServer::start(false).await;

    let response = server.upload("espresso.txt", GUIDE.as_bytes().to_vec()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["filename"], "espresso.txt");
    assert_eq!(body["size"], GUIDE.len());
    assert!(body["chunks"].as_u64().unwrap() >= 1);
    assert_eq!(body["message"], "File uploaded and processed successfully");

    let response = server
        .client
        .post(server.url("/query"))
        .json(&json!({"question": "How often should the machine be descaled?", "k": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["question"], "How often should the machine be descaled?");
    assert!(body["answer"].as_str().unwrap().starts_with("answer"));

    let sources = body["sources"].as_array().unwrap();
    assert!(!sources.is_empty() && sources.len() <= 2);
    assert_eq!(sources[0]["metadata"]["source"], "espresso.txt");
    let content = sources[0]["content"].as_str().unwrap();
    assert!(content.ends_with("..."));
    assert!(content.chars().count() <= 43);
}

#[tokio::test]
async fn test_chat_returns_extended_history() {
    let server = TestServer::start(false).await;
    server.upload("espresso.txt", GUIDE.as_bytes().to_vec()).await;

    let body: Value = server
        .client
        .post(server.url("/chat"))
        .json(&json!({
            "question": "And the grinder?",
            "chat_history": [{"question": "How often to descale?", "answer": "Every two months."}]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let history = body["chat_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["question"], "And the grinder?");
    assert_eq!(history[1]["answer"], body["answer"]);
}

#[tokio::test]
async fn test_similar_status_documents_and_clear() {
    let server = TestServer::start(false).await;
    server.upload("espresso.txt", GUIDE.as_bytes().to_vec()).await;
    server
        .upload("notes.md", b"# Notes\n\nUnrelated gardening notes.".to_vec())
        .await;

    let hits: Value = server
        .client
        .get(server.url("/similar?query=grinder%20burrs&k=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["metadata"]["source"], "espresso.txt");
    assert!(hits[0]["similarity_score"].as_f64().unwrap() > 0.0);

    let status: Value = server
        .client
        .get(server.url("/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["status"], "active");
    assert_eq!(status["document_count"], 2);
    assert_eq!(status["dimension"], 256);
    assert_eq!(status["embedding_backend"], "trigram");
    assert_eq!(status["llm_backend"], "stub");

    let documents: Value = server
        .client
        .get(server.url("/documents"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(documents["document_count"], 2);
    assert_eq!(documents["documents"][1]["filename"], "notes.md");
    assert_eq!(documents["documents"][1]["file_type"], "markdown");

    let cleared = server
        .client
        .delete(server.url("/documents"))
        .send()
        .await
        .unwrap();
    assert_eq!(cleared.status(), StatusCode::OK);

    let status: Value = server
        .client
        .get(server.url("/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["entry_count"], 0);
    assert_eq!(status["document_count"], 0);
}

#[tokio::test]
async fn test_query_on_empty_index() {
    let server = TestServer::start(false).await;

    let response = server
        .client
        .post(server.url("/query"))
        .json(&json!({"question": "Is anything indexed?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert!(body["sources"].as_array().unwrap().is_empty());
    assert!(!body["answer"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_uploads_are_client_errors() {
    let server = TestServer::start(false).await;

    let response = server
        .upload("broken.pdf", b"%PDF-1.4 this is not a real pdf".to_vec())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "extraction_error");

    let response = server.upload("photo.jpg", vec![0xff, 0xd8, 0xff, 0xe0]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server.upload("big.txt", vec![b'a'; 65 * 1024]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_input");

    let form = Form::new().text("other", "value");
    let response = server
        .client
        .post(server.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn test_body_over_limit_is_structured_error() {
    let server = TestServer::start(false).await;

    // Above max_file_size plus the multipart slack, so the body limit rejects it
    let response = server.upload("huge.txt", vec![b'a'; 2 * 1024 * 1024]).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("limit"));

    let status: Value = server
        .client
        .get(server.url("/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["entry_count"], 0);
}

#[tokio::test]
async fn test_invalid_requests() {
    let server = TestServer::start(false).await;

    let response = server
        .client
        .post(server.url("/query"))
        .json(&json!({"question": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_input");

    let response = server
        .client
        .post(server.url("/query"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_input");

    let response = server
        .client
        .get(server.url("/similar"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generation_failure_is_bad_gateway() {
    let server = TestServer::start(true).await;

    let response = server
        .client
        .post(server.url("/query"))
        .json(&json!({"question": "Will this fail?"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "generation_error");
    assert!(body["message"].as_str().unwrap().contains("upstream timed out"));
}
