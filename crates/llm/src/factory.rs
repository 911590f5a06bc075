//! LLM provider factory.
//!
//! Builds the configured `LlmClient`, resolving secrets from the
//! environment for hosted backends.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use docqa_core::config::{LlmBackend, LlmConfig};
use docqa_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client from configuration.
///
/// # Errors
/// Returns `Authentication` when a hosted backend's API key variable is unset.
pub fn create_client(config: &LlmConfig) -> AppResult<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match &config.backend {
        LlmBackend::Ollama { endpoint, model } => {
            tracing::debug!(%endpoint, %model, "Creating Ollama LLM client");
            Ok(Arc::new(OllamaClient::with_options(
                endpoint.as_str(),
                model.as_str(),
                timeout,
            )?))
        }
        LlmBackend::OpenAi {
            model,
            api_key_env,
            endpoint,
        } => {
            let api_key = AppConfig::resolve_api_key(api_key_env).ok_or_else(|| {
                AppError::auth("openai", format!("{} is not set", api_key_env))
            })?;
            tracing::debug!(%model, "Creating OpenAI LLM client");
            Ok(Arc::new(OpenAiClient::new(
                api_key,
                model.as_str(),
                endpoint.as_deref(),
                timeout,
            )?))
        }
    }
}
