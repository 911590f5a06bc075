//! Embedding providers.
//!
//! The set of backends is closed: hosted OpenAI-compatible APIs, a local
//! Ollama runtime, and an on-device trigram hasher. The backend is chosen
//! once, from typed configuration, when the knowledge base is opened.

pub mod provider;
pub mod providers;

pub use provider::{check_dimensions, create_provider, EmbeddingProvider};
