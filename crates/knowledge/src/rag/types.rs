//! RAG response types.

use serde::{Deserialize, Serialize};

use crate::types::ChunkMetadata;

/// A retrieved chunk cited by an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Full chunk text
    pub text: String,

    pub metadata: ChunkMetadata,

    /// Similarity score from the index search
    pub score: f32,
}

impl SourceRef {
    /// Chunk text shortened to at most `max_chars` characters for display.
    pub fn snippet(&self, max_chars: usize) -> String {
        truncate_snippet(&self.text, max_chars)
    }
}

/// Answer produced for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Language model completion
    pub text: String,

    /// Retrieved chunks, in search order
    pub sources: Vec<SourceRef>,
}

/// Settings for the answering step.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSettings {
    /// Most recent history turns rendered into the prompt
    pub max_history_turns: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            max_history_turns: 3,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Cut `text` to at most `max_chars` characters, preferring a word
/// boundary, and mark the cut with `...`.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    let ends_on_word = text
        .chars()
        .nth(max_chars)
        .is_some_and(char::is_whitespace);
    let cut = match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 && !ends_on_word => &cut[..pos],
        _ => cut.as_str(),
    };

    format!("{}...", cut.trim_end())
}
