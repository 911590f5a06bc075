//! The knowledge base: ingestion, index, registry and answerer behind one
//! explicitly constructed handle.
//!
//! Surfaces hold a `KnowledgeBase` in an `Arc` and call its boundary
//! operations. Uploads and clears are serialized by a write gate so that a
//! failed upload can be rolled back without disturbing another one.

use docqa_core::config::{IngestConfig, RetrievalConfig};
use docqa_core::{AppConfig, AppError, AppResult};
use docqa_llm::LlmClient;
use docqa_prompt::{resolve_prompt, HistoryTurn, PromptDefinition, RAG_ANSWER_PROMPT_ID};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::ingest::Ingestor;
use crate::rag::{Answer, AnswerSettings, RagAnswerer};
use crate::sources::SourceRegistry;
use crate::types::{DocumentRecord, Status, UploadReport};
use crate::vector_index::{IndexEntry, SearchHit, VectorIndex};

/// Snapshot file inside the index directory.
pub const INDEX_FILE: &str = "index.json";

/// Parts needed to assemble a knowledge base without a config file.
pub struct KnowledgeBaseParts {
    pub ingest: IngestConfig,
    pub retrieval: RetrievalConfig,
    pub answer: AnswerSettings,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmClient>,
    pub prompt: PromptDefinition,
}

pub struct KnowledgeBase {
    ingestor: Ingestor,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    registry: SourceRegistry,
    answerer: RagAnswerer,
    retrieval: RetrievalConfig,
    write_gate: Mutex<()>,
}

impl KnowledgeBase {
    /// Build every component from configuration and load the stored index.
    ///
    /// Backends are constructed lazily: no embedding or generation request
    /// is made here.
    pub async fn open(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        config.ensure_state_dir()?;

        let embedder = create_provider(&config.embedding)?;
        let llm = docqa_llm::create_client(&config.llm)?;
        let prompt = resolve_prompt(&config.prompts_dir(), RAG_ANSWER_PROMPT_ID)?;

        tracing::info!(
            embedding_backend = embedder.provider_name(),
            embedding_model = embedder.model_name(),
            dimension = embedder.dimensions(),
            llm_backend = llm.provider_name(),
            llm_model = llm.model_name(),
            "Opening knowledge base"
        );

        let parts = KnowledgeBaseParts {
            ingest: config.ingest.clone(),
            retrieval: config.retrieval.clone(),
            answer: AnswerSettings {
                max_history_turns: config.retrieval.max_history_turns,
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
            },
            embedder,
            llm,
            prompt,
        };

        Self::from_parts(parts, &config.index_dir()).await
    }

    /// Assemble from prebuilt parts, persisting under `index_dir`.
    pub async fn from_parts(parts: KnowledgeBaseParts, index_dir: &Path) -> AppResult<Self> {
        let index = Arc::new(VectorIndex::with_path(
            parts.embedder.dimensions(),
            parts.retrieval.metric,
            index_dir.join(INDEX_FILE),
        ));
        index.load().await?;

        let answerer = RagAnswerer::new(
            parts.embedder.clone(),
            index.clone(),
            parts.llm,
            parts.prompt,
            parts.answer,
        );

        Ok(Self {
            ingestor: Ingestor::new(parts.ingest),
            embedder: parts.embedder,
            index,
            registry: SourceRegistry::new(index_dir),
            answerer,
            retrieval: parts.retrieval,
            write_gate: Mutex::new(()),
        })
    }

    /// Ingest, embed and store one document.
    ///
    /// All of the document's chunks are stored or none are.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(&self, bytes: &[u8], filename: &str) -> AppResult<UploadReport> {
        let document = {
            let ingestor = self.ingestor.clone();
            let bytes = bytes.to_vec();
            let filename = filename.to_string();
            tokio::task::spawn_blocking(move || ingestor.ingest(&bytes, &filename))
                .await
                .map_err(|e| AppError::Other(format!("Ingestion task failed: {}", e)))??
        };

        let texts: Vec<String> = document.chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<IndexEntry> = document
            .chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry {
                embedding,
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
            })
            .collect();

        let record = DocumentRecord::from_ingested(&document);

        let _gate = self.write_gate.lock().await;
        let before = self.index.count().await;
        self.index.add(entries).await?;

        if let Err(e) = self.commit(&record).await {
            tracing::error!(filename = %document.filename, error = %e, "Upload failed; rolling back");
            self.index.truncate(before).await;
            if let Err(restore) = self.index.persist().await {
                tracing::warn!(error = %restore, "Failed to restore index snapshot after rollback");
            }
            return Err(e);
        }

        tracing::info!(
            filename = %document.filename,
            chunks = document.chunks.len(),
            entries = before + document.chunks.len(),
            "Uploaded document"
        );

        Ok(UploadReport {
            filename: document.filename,
            chunks: document.chunks.len(),
            size: document.byte_size,
        })
    }

    async fn commit(&self, record: &DocumentRecord) -> AppResult<()> {
        self.index.persist().await?;
        self.registry.track(record)
    }

    /// Answer a question. `k` defaults to the configured search depth.
    pub async fn query(
        &self,
        question: &str,
        k: Option<usize>,
        history: &[HistoryTurn],
    ) -> AppResult<Answer> {
        self.answerer
            .query(question, k.unwrap_or(self.retrieval.search_k), history)
            .await
    }

    /// Similarity search without generation.
    pub async fn search(&self, query: &str, k: Option<usize>) -> AppResult<Vec<SearchHit>> {
        self.answerer
            .search(query, k.unwrap_or(self.retrieval.search_k))
            .await
    }

    pub async fn status(&self) -> AppResult<Status> {
        let documents = self.registry.list()?;
        let llm = self.answerer.llm();

        Ok(Status {
            entry_count: self.index.count().await,
            document_count: documents.len(),
            dimension: self.index.dimension(),
            metric: self.index.metric(),
            embedding_backend: self.embedder.provider_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            llm_backend: llm.provider_name().to_string(),
            llm_model: llm.model_name().to_string(),
        })
    }

    /// Uploaded documents, oldest first.
    pub fn documents(&self) -> AppResult<Vec<DocumentRecord>> {
        self.registry.list()
    }

    /// Remove every entry and document record. Idempotent.
    ///
    /// If the empty snapshot cannot be written, the entries are restored so
    /// memory keeps matching what is on disk.
    pub async fn clear(&self) -> AppResult<()> {
        let _gate = self.write_gate.lock().await;
        let previous = self.index.entries().await;
        self.index.clear().await;

        if let Err(e) = self.index.persist().await {
            tracing::error!(error = %e, entries = previous.len(), "Clear failed; restoring entries");
            self.index.add(previous).await?;
            return Err(e);
        }

        self.registry.clear()?;
        tracing::info!("Cleared knowledge base");
        Ok(())
    }

    /// Write the index snapshot.
    pub async fn persist(&self) -> AppResult<()> {
        let _gate = self.write_gate.lock().await;
        self.index.persist().await
    }

    pub fn snippet_length(&self) -> usize {
        self.retrieval.snippet_length
    }

    pub fn max_file_size(&self) -> usize {
        self.ingestor.max_file_size()
    }
}
