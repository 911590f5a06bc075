//! Error types for docqa.
//!
//! This module defines a unified error enum covering every failure category
//! of the ingestion and question-answering pipeline. Each variant maps to a
//! stable `kind` string so that request surfaces can report a structured
//! `(kind, message)` pair.

use thiserror::Error;

/// Unified error type for docqa.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller supplied an unusable request (empty question, oversized file)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input document could not be parsed or holds no text
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Missing or rejected credential for a hosted backend
    #[error("Authentication error ({provider}): {message}")]
    Authentication { provider: String, message: String },

    /// Quota or rate limit hit on a hosted backend
    #[error("Rate limit error ({provider}): {message}")]
    RateLimit { provider: String, message: String },

    /// Local model weights are unavailable
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Embedding backend failed for another reason (network, bad response)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector dimension disagrees with the index
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Language model call failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// Vector index storage errors
    #[error("Index error: {0}")]
    Index(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::Extraction(_) => "extraction_error",
            Self::Authentication { .. } => "authentication_error",
            Self::RateLimit { .. } => "rate_limit_error",
            Self::ModelLoad(_) => "model_load_error",
            Self::Embedding(_) => "embedding_error",
            Self::DimensionMismatch { .. } => "dimension_mismatch_error",
            Self::Generation(_) => "generation_error",
            Self::Index(_) => "index_error",
            Self::Prompt(_) => "prompt_error",
            Self::Serialization(_) => "serialization_error",
            Self::Other(_) => "internal_error",
        }
    }

    /// Whether a caller may retry the same request later and expect success.
    ///
    /// Credential and quota errors count as retryable: the caller fixes the
    /// key or backs off. Bad documents and configuration errors do not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. }
                | Self::RateLimit { .. }
                | Self::Embedding(_)
                | Self::Generation(_)
        )
    }

    /// Convenience constructor for authentication failures.
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for rate-limit failures.
    pub fn rate_limit(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimit {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
