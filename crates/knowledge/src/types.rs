//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use docqa_core::config::SimilarityMetric;
use serde::{Deserialize, Serialize};

use crate::parser::DocumentFormat;

/// Metadata attached to every chunk and stored with its index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Filename of the document the chunk came from
    pub source: String,

    /// Document format ("pdf", "text", "markdown")
    pub file_type: String,

    /// Sequential index of the chunk within its document
    pub chunk_id: usize,

    /// Length of the chunk in characters
    pub chunk_size: usize,

    /// Character offset of the chunk start in the extracted text
    pub start: usize,

    /// Character offset one past the chunk end
    pub end: usize,
}

/// A chunk of extracted document text, before embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Output of ingesting one document.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub filename: String,
    pub format: DocumentFormat,
    pub page_count: usize,
    pub byte_size: usize,

    /// Hex SHA-256 of the uploaded bytes
    pub sha256: String,

    /// Chunks in document order
    pub chunks: Vec<Chunk>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReport {
    pub filename: String,
    pub chunks: usize,
    pub size: usize,
}

/// Summary of the knowledge base state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub entry_count: usize,
    pub document_count: usize,
    pub dimension: usize,
    pub metric: SimilarityMetric,
    pub embedding_backend: String,
    pub embedding_model: String,
    pub llm_backend: String,
    pub llm_model: String,
}

/// One uploaded document, as recorded in `sources.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique document identifier
    pub id: String,

    pub filename: String,
    pub file_type: String,
    pub pages: usize,
    pub chunks: usize,
    pub bytes: usize,

    /// Hex SHA-256 of the uploaded bytes
    pub sha256: String,

    /// When this document was indexed
    pub indexed_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn from_ingested(document: &IngestedDocument) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            filename: document.filename.clone(),
            file_type: document.format.as_str().to_string(),
            pages: document.page_count,
            chunks: document.chunks.len(),
            bytes: document.byte_size,
            sha256: document.sha256.clone(),
            indexed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_ingested() {
        let document = IngestedDocument {
            filename: "notes.txt".to_string(),
            format: DocumentFormat::PlainText,
            page_count: 1,
            byte_size: 42,
            sha256: "ab".repeat(32),
            chunks: vec![Chunk {
                text: "hello".to_string(),
                metadata: ChunkMetadata {
                    source: "notes.txt".to_string(),
                    file_type: "text".to_string(),
                    chunk_id: 0,
                    chunk_size: 5,
                    start: 0,
                    end: 5,
                },
            }],
        };

        let record = DocumentRecord::from_ingested(&document);
        assert_eq!(record.filename, "notes.txt");
        assert_eq!(record.file_type, "text");
        assert_eq!(record.chunks, 1);
        assert_eq!(record.bytes, 42);
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_metadata_json_shape() {
        let metadata = ChunkMetadata {
            source: "a.pdf".to_string(),
            file_type: "pdf".to_string(),
            chunk_id: 3,
            chunk_size: 1000,
            start: 2400,
            end: 3400,
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["source"], "a.pdf");
        assert_eq!(json["chunk_id"], 3);
        assert_eq!(json["end"], 3400);
    }
}
