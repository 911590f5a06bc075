//! Embedding provider trait and factory.

use docqa_core::config::{EmbeddingBackend, EmbeddingConfig};
use docqa_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

use super::providers::{OllamaProvider, OpenAiProvider, TrigramProvider};

/// Trait for embedding providers.
///
/// `embed_batch` returns one vector per input, in input order, each of
/// length `dimensions()`.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "openai", "ollama", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create the embedding provider selected by configuration.
///
/// # Errors
/// Returns `Authentication` when the hosted backend's API key variable is unset.
pub fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match &config.backend {
        EmbeddingBackend::OpenAi {
            model,
            dimensions,
            api_key_env,
            endpoint,
        } => {
            let api_key = AppConfig::resolve_api_key(api_key_env).ok_or_else(|| {
                AppError::auth("openai", format!("{} is not set", api_key_env))
            })?;
            Ok(Arc::new(OpenAiProvider::new(
                api_key,
                model.as_str(),
                *dimensions,
                endpoint.as_deref(),
                config.batch_size,
                timeout,
            )?))
        }

        EmbeddingBackend::Ollama {
            endpoint,
            model,
            dimensions,
        } => Ok(Arc::new(OllamaProvider::new(
            endpoint.as_str(),
            model.as_str(),
            *dimensions,
            timeout,
        )?)),

        EmbeddingBackend::Trigram { dimensions } => Ok(Arc::new(TrigramProvider::new(*dimensions))),
    }
}

/// Verify that every vector has the declared dimension.
pub fn check_dimensions(expected: usize, vectors: &[Vec<f32>]) -> AppResult<()> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(bad) => Err(AppError::DimensionMismatch {
            expected,
            actual: bad.len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_trigram_provider() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Trigram { dimensions: 384 },
            ..Default::default()
        };

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_ollama_provider_is_lazy() {
        // No request is made until the first embed call
        let provider = create_provider(&EmbeddingConfig::default()).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "nomic-embed-text");
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_openai_without_key_is_authentication_error() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::OpenAi {
                model: "text-embedding-3-small".to_string(),
                dimensions: 1536,
                api_key_env: "DOCQA_TEST_EMBED_KEY_NEVER_SET".to_string(),
                endpoint: None,
            },
            ..Default::default()
        };

        let err = create_provider(&config).unwrap_err();
        assert_eq!(err.kind(), "authentication_error");
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(3, &[vec![0.0; 3], vec![1.0; 3]]).is_ok());

        let err = check_dimensions(3, &[vec![0.0; 3], vec![1.0; 4]]).unwrap_err();
        assert!(matches!(
            err,
            AppError::DimensionMismatch {
                expected: 3,
                actual: 4
            }
        ));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&EmbeddingConfig {
            backend: EmbeddingBackend::Trigram { dimensions: 64 },
            ..Default::default()
        })
        .unwrap();

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 64);
    }
}
