//! Prompt types for docqa.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    pub api_version: String,

    /// Creator identifier
    #[serde(default)]
    pub created_by: String,

    /// System instructions sent alongside the rendered template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax
    pub template: String,
}

/// One retrieved chunk as exposed to the template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextBlock {
    /// 1-based position in retrieval order
    pub index: usize,
    pub source: String,
    pub chunk_id: usize,
    pub text: String,
}

/// One prior (question, answer) exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryTurn {
    pub question: String,
    pub answer: String,
}

/// Template variables for an answering prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromptInput {
    pub question: String,
    pub context: Vec<ContextBlock>,
    pub has_context: bool,
    pub history: Vec<HistoryTurn>,
}

impl PromptInput {
    pub fn new(
        question: impl Into<String>,
        context: Vec<ContextBlock>,
        history: Vec<HistoryTurn>,
    ) -> Self {
        Self {
            question: question.into(),
            has_context: !context.is_empty(),
            context,
            history,
        }
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    pub source_prompt_id: String,

    /// Number of context blocks rendered
    pub context_blocks: usize,

    /// Number of history turns rendered
    pub history_turns: usize,
}
