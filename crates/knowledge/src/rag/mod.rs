//! RAG (Retrieval-Augmented Generation) answering.

pub mod answer;
pub mod types;

pub use answer::RagAnswerer;
pub use types::{truncate_snippet, Answer, AnswerSettings, SourceRef};
