//! Ollama completion provider (`/api/generate`, non-streaming).

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    options: GenerateOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Non-streaming `/api/generate` reply.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl From<GenerateResponse> for LlmResponse {
    fn from(reply: GenerateResponse) -> Self {
        LlmResponse {
            usage: LlmUsage::new(
                reply.prompt_eval_count.unwrap_or(0),
                reply.eval_count.unwrap_or(0),
            ),
            content: reply.response,
            model: reply.model,
        }
    }
}

/// Completion client for a local Ollama runtime.
pub struct OllamaClient {
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl OllamaClient {
    /// Client for `model` on the default local endpoint.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Client with a custom endpoint and request timeout.
    pub fn with_options(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            http,
        })
    }

    fn generate_body<'a>(&'a self, request: &'a LlmRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> AppError {
        if error.is_connect() {
            AppError::ModelLoad(format!(
                "Ollama is not reachable at {}; start it with `ollama serve`",
                self.base_url
            ))
        } else if error.is_timeout() {
            AppError::Generation(format!("Ollama did not answer in time: {}", error))
        } else {
            AppError::Generation(format!("Ollama request failed: {}", error))
        }
    }
}

/// Map a non-success Ollama status to the error taxonomy.
fn classify_error(status: reqwest::StatusCode, body: &str, model: &str) -> AppError {
    if status == reqwest::StatusCode::NOT_FOUND && body.contains("not found") {
        return AppError::ModelLoad(format!(
            "Ollama model '{}' is not available (run `ollama pull {}`): {}",
            model, model, body
        ));
    }
    AppError::Generation(format!("Ollama API error ({}): {}", status, body))
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[tracing::instrument(skip_all, fields(model = %self.model, prompt_chars = request.prompt.len()))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.generate_body(request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body, &self.model));
        }

        let reply: GenerateResponse = response.json().await.map_err(|e| {
            AppError::Generation(format!("Unreadable Ollama response: {}", e))
        })?;

        tracing::debug!(
            prompt_tokens = reply.prompt_eval_count,
            completion_tokens = reply.eval_count,
            "Ollama completion received"
        );
        Ok(reply.into())
    }
}
