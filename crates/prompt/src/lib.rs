//! Prompt system for docqa.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - A built-in default answering prompt, overridable per workspace
//! - Handlebars template rendering of retrieved context and chat history

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{default_prompt, load_prompt, resolve_prompt, RAG_ANSWER_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, ContextBlock, HistoryTurn, PromptDefinition, PromptInput};
