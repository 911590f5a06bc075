//! Document knowledge base for docqa.
//!
//! Uploaded documents are extracted and chunked by the [`Ingestor`], embedded
//! by an [`EmbeddingProvider`], and stored in a persisted [`VectorIndex`].
//! Questions are answered by the [`RagAnswerer`], which retrieves the most
//! similar chunks and passes them to a language model. [`KnowledgeBase`] ties
//! these together behind the boundary operations used by the server and CLI.

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod knowledge_base;
pub mod parser;
pub mod rag;
pub mod sources;
pub mod types;
pub mod vector_index;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use ingest::Ingestor;
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseParts};
pub use parser::DocumentFormat;
pub use rag::{truncate_snippet, Answer, AnswerSettings, RagAnswerer, SourceRef};
pub use sources::SourceRegistry;
pub use types::{Chunk, ChunkMetadata, DocumentRecord, IngestedDocument, Status, UploadReport};
pub use vector_index::{IndexEntry, SearchHit, VectorIndex};
