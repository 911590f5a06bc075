//! Document ingestion: bytes in, ordered chunks out.

use docqa_core::config::IngestConfig;
use docqa_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::chunker::chunk_text;
use crate::parser::{extract_text, DocumentFormat};
use crate::types::{Chunk, ChunkMetadata, IngestedDocument};

/// Turns uploaded documents into chunks with source metadata.
///
/// Ingestion has no side effects; storing the chunks is the caller's job.
#[derive(Debug, Clone)]
pub struct Ingestor {
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Largest accepted upload in bytes.
    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    /// Extract and chunk one document.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty filename or a file over `max_file_size`
    /// - `Extraction` when the bytes cannot be parsed or hold no text
    pub fn ingest(&self, bytes: &[u8], filename: &str) -> AppResult<IngestedDocument> {
        let filename = sanitize_filename(filename)?;

        if bytes.len() > self.config.max_file_size {
            return Err(AppError::InvalidInput(format!(
                "{} is {} bytes; the limit is {} bytes",
                filename,
                bytes.len(),
                self.config.max_file_size
            )));
        }

        if bytes.is_empty() {
            return Err(AppError::Extraction(format!("{} is empty", filename)));
        }

        let format = DocumentFormat::detect(&filename, bytes)?;
        let extracted = extract_text(bytes, format)?;
        let text = extracted.joined();

        if text.trim().is_empty() {
            return Err(AppError::Extraction(format!(
                "No text could be extracted from {}",
                filename
            )));
        }

        let chunks: Vec<Chunk> = chunk_text(&text, self.config.chunk_size, self.config.chunk_overlap)
            .into_iter()
            .map(|span| Chunk {
                metadata: ChunkMetadata {
                    source: filename.clone(),
                    file_type: format.as_str().to_string(),
                    chunk_id: span.position,
                    chunk_size: span.end - span.start,
                    start: span.start,
                    end: span.end,
                },
                text: span.text,
            })
            .collect();

        tracing::info!(
            filename = %filename,
            format = format.as_str(),
            pages = extracted.page_count(),
            chunks = chunks.len(),
            "Ingested document"
        );

        Ok(IngestedDocument {
            filename,
            format,
            page_count: extracted.page_count(),
            byte_size: bytes.len(),
            sha256: format!("{:x}", Sha256::digest(bytes)),
            chunks,
        })
    }
}

/// Keep only the final path component of a client-supplied filename.
fn sanitize_filename(filename: &str) -> AppResult<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename).trim();

    match Path::new(name).file_name().and_then(|n| n.to_str()) {
        Some(n) if !n.is_empty() => Ok(n.to_string()),
        _ => Err(AppError::InvalidInput(
            "A filename is required".to_string(),
        )),
    }
}
