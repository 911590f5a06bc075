//! Request and response bodies, and the route handlers that use them.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::Utc;
use docqa_knowledge::{truncate_snippet, Answer, ChunkMetadata, DocumentRecord, Status};
use docqa_prompt::HistoryTurn;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub k: Option<usize>,
    #[serde(default)]
    pub chat_history: Vec<HistoryTurn>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarParams {
    pub query: String,
    pub k: Option<usize>,
}

/// A cited chunk, with its text cut to the configured snippet length.
#[derive(Debug, Serialize, Deserialize)]
pub struct SourceView {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceView>,
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceView>,
    pub chat_history: Vec<HistoryTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub chunks: usize,
    pub size: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(flatten)]
    pub index: Status,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentsResponse {
    pub document_count: usize,
    pub entry_count: usize,
    pub documents: Vec<DocumentRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarHit {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub similarity_score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn source_views(answer: &Answer, snippet_length: usize) -> Vec<SourceView> {
    answer
        .sources
        .iter()
        .map(|source| SourceView {
            content: source.snippet(snippet_length),
            metadata: source.metadata.clone(),
            score: source.score,
        })
        .collect()
}

pub async fn index() -> impl IntoResponse {
    Html(include_str!("../ui/index.html"))
}

pub async fn info() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "docqa document question answering API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active",
    }))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::invalid_input("The file field has no filename"))?;
        let bytes = field.bytes().await?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::invalid_input("Missing multipart field 'file'"))?;

    let report = state.kb.upload(&bytes, &filename).await?;

    Ok(Json(UploadResponse {
        message: "File uploaded and processed successfully".to_string(),
        filename: report.filename,
        chunks: report.chunks,
        size: report.size,
    }))
}

pub async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<QueryResponse>> {
    let Json(request) = payload?;
    let answer = state.kb.query(&request.question, request.k, &[]).await?;

    Ok(Json(QueryResponse {
        sources: source_views(&answer, state.kb.snippet_length()),
        answer: answer.text,
        question: request.question,
    }))
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload?;
    let answer = state
        .kb
        .query(&request.question, request.k, &request.chat_history)
        .await?;

    let sources = source_views(&answer, state.kb.snippet_length());
    let mut chat_history = request.chat_history;
    chat_history.push(HistoryTurn {
        question: request.question,
        answer: answer.text.clone(),
    });

    Ok(Json(ChatResponse {
        answer: answer.text,
        sources,
        chat_history,
    }))
}

pub async fn status(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    Ok(Json(StatusResponse {
        status: "active".to_string(),
        index: state.kb.status().await?,
    }))
}

pub async fn documents(State(state): State<AppState>) -> ApiResult<Json<DocumentsResponse>> {
    let status = state.kb.status().await?;
    let documents = state.kb.documents()?;

    Ok(Json(DocumentsResponse {
        document_count: documents.len(),
        entry_count: status.entry_count,
        documents,
    }))
}

pub async fn clear(State(state): State<AppState>) -> ApiResult<Json<MessageResponse>> {
    state.kb.clear().await?;
    Ok(Json(MessageResponse {
        message: "All documents cleared successfully".to_string(),
    }))
}

pub async fn similar(
    State(state): State<AppState>,
    params: Result<Query<SimilarParams>, QueryRejection>,
) -> ApiResult<Json<Vec<SimilarHit>>> {
    let Query(params) = params?;
    let hits = state.kb.search(&params.query, params.k).await?;
    let snippet_length = state.kb.snippet_length();

    Ok(Json(
        hits.into_iter()
            .map(|hit| SimilarHit {
                content: truncate_snippet(&hit.entry.text, snippet_length),
                metadata: hit.entry.metadata,
                similarity_score: hit.score,
            })
            .collect(),
    ))
}
