//! HTTP surface for docqa.
//!
//! A thin axum layer over [`KnowledgeBase`]: handlers parse requests, call one
//! boundary operation, and render the result or a `{kind, message}` error.

pub mod api;
pub mod error;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use docqa_knowledge::KnowledgeBase;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, ApiResult};

/// Room for multipart framing around the largest accepted file.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub kb: Arc<KnowledgeBase>,
}

impl AppState {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self { kb }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.kb.max_file_size().saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/", get(api::index))
        .route("/info", get(api::info))
        .route("/health", get(api::health))
        .route("/upload", post(api::upload))
        .route("/query", post(api::query))
        .route("/chat", post(api::chat))
        .route("/status", get(api::status))
        .route("/documents", get(api::documents).delete(api::clear))
        .route("/similar", get(api::similar))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::map_response(payload_too_large_as_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// The body limit layer answers 413 in plain text; give it the API error shape.
async fn payload_too_large_as_json(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "invalid_input",
            "Request body exceeds the upload size limit",
        )
        .into_response();
    }
    response
}

/// Serve the API on `host:port` until Ctrl+C.
pub async fn serve(kb: Arc<KnowledgeBase>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = app_router(AppState::new(kb.clone()));
    let listener = bind(host, port).await?;
    let addr = listener.local_addr()?;
    info!("docqa listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    kb.persist().await?;
    info!("Server stopped");
    Ok(())
}

/// Bind a listener; `host` may be an IP literal or a name such as `localhost`.
async fn bind(host: &str, port: u16) -> anyhow::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
