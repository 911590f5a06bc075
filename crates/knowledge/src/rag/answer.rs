//! Retrieval-augmented answering.
//!
//! Embeds the question, retrieves the top-k chunks, renders them with the
//! caller's chat history into the answering prompt, and asks the language
//! model. An empty index is not an error: the model is still asked, with
//! no context.

use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use docqa_prompt::{build_prompt, ContextBlock, HistoryTurn, PromptDefinition, PromptInput};
use std::sync::Arc;
use tracing::instrument;

use crate::embeddings::EmbeddingProvider;
use crate::rag::types::{Answer, AnswerSettings, SourceRef};
use crate::vector_index::{SearchHit, VectorIndex};

/// Answers questions over the shared vector index.
pub struct RagAnswerer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    settings: AnswerSettings,
}

impl RagAnswerer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: AnswerSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            llm,
            prompt,
            settings,
        }
    }

    pub fn llm(&self) -> &dyn LlmClient {
        self.llm.as_ref()
    }

    /// Answer `question` from the top `k` chunks and the recent history.
    ///
    /// # Errors
    /// - `InvalidInput` for a blank question
    /// - embedding and index errors keep their own kinds
    /// - `Generation` for any failure of the language model call
    #[instrument(skip(self, question, history), fields(history_turns = history.len()))]
    pub async fn query(
        &self,
        question: &str,
        k: usize,
        history: &[HistoryTurn],
    ) -> AppResult<Answer> {
        let question = require_text(question, "question")?;
        let hits = self.search(question, k).await?;

        tracing::info!(
            retrieved = hits.len(),
            top_score = hits.first().map(|h| h.score).unwrap_or(0.0),
            "Retrieved context"
        );

        let input = PromptInput::new(question, context_blocks(&hits), self.recent(history));
        let built = build_prompt(&self.prompt, &input)?;

        let mut request = LlmRequest::new(built.user)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self.llm.complete(&request).await.map_err(|e| match e {
            AppError::Generation(_) => e,
            other => AppError::Generation(format!(
                "{} ({}) failed: {}",
                self.llm.provider_name(),
                self.llm.model_name(),
                other
            )),
        })?;

        tracing::debug!(
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Generated answer"
        );

        Ok(Answer {
            text: response.content,
            sources: hits
                .into_iter()
                .map(|hit| SourceRef {
                    text: hit.entry.text,
                    metadata: hit.entry.metadata,
                    score: hit.score,
                })
                .collect(),
        })
    }

    /// Similarity search only; no generation call.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<SearchHit>> {
        let query = require_text(query, "query")?;
        let embedding = self.embedder.embed(query).await?;
        self.index.search(&embedding, k).await
    }

    fn recent(&self, history: &[HistoryTurn]) -> Vec<HistoryTurn> {
        let skip = history.len().saturating_sub(self.settings.max_history_turns);
        history[skip..].to_vec()
    }
}

fn require_text<'a>(text: &'a str, what: &str) -> AppResult<&'a str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(trimmed)
}

fn context_blocks(hits: &[SearchHit]) -> Vec<ContextBlock> {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| ContextBlock {
            index: i + 1,
            source: hit.entry.metadata.source.clone(),
            chunk_id: hit.entry.metadata.chunk_id,
            text: hit.entry.text.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::types::ChunkMetadata;
    use crate::vector_index::IndexEntry;
    use async_trait::async_trait;
    use docqa_core::config::SimilarityMetric;
    use docqa_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;

    /// Records every request and replies with a fixed outcome.
    struct ScriptedLlm {
        reply: Result<String, fn() -> AppError>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedLlm {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(make: fn() -> AppError) -> Self {
            Self {
                reply: Err(make),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_prompt(&self) -> String {
            self.requests.lock().unwrap().last().unwrap().prompt.clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn model_name(&self) -> &str {
            "scripted-1"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: "scripted-1".to_string(),
                    usage: LlmUsage::default(),
                }),
                Err(make) => Err(make()),
            }
        }
    }

    const DIM: usize = 256;

    async fn answerer_with(llm: Arc<ScriptedLlm>, texts: &[&str]) -> RagAnswerer {
        let embedder = Arc::new(TrigramProvider::new(DIM));
        let index = Arc::new(VectorIndex::new(DIM, SimilarityMetric::Cosine));

        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let embeddings = embedder.embed_batch(&owned).await.unwrap();
        let entries = owned
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (text, embedding))| IndexEntry {
                metadata: ChunkMetadata {
                    source: "guide.txt".to_string(),
                    file_type: "text".to_string(),
                    chunk_id: i,
                    chunk_size: text.chars().count(),
                    start: 0,
                    end: text.chars().count(),
                },
                text,
                embedding,
            })
            .collect();
        index.add(entries).await.unwrap();

        RagAnswerer::new(
            embedder,
            index,
            llm,
            docqa_prompt::default_prompt().unwrap(),
            AnswerSettings {
                max_history_turns: 2,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_query_returns_answer_and_ordered_sources() {
        let llm = Arc::new(ScriptedLlm::replying("Rust prevents data races."));
        let answerer = answerer_with(
            llm.clone(),
            &[
                "Tomatoes need full sun and regular watering.",
                "Rust ownership rules prevent data races at compile time.",
                "Sourdough bread needs a mature starter.",
            ],
        )
        .await;

        let answer = answerer
            .query("How does Rust prevent data races?", 2, &[])
            .await
            .unwrap();

        assert_eq!(answer.text, "Rust prevents data races.");
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].metadata.chunk_id, 1);
        assert!(answer.sources[0].score >= answer.sources[1].score);

        let prompt = llm.last_prompt();
        assert!(prompt.contains("Rust ownership rules prevent data races"));
        assert!(prompt.contains("How does Rust prevent data races?"));
    }

    #[tokio::test]
    async fn test_empty_index_still_calls_model() {
        let llm = Arc::new(ScriptedLlm::replying("I don't know."));
        let answerer = answerer_with(llm.clone(), &[]).await;

        let answer = answerer.query("Anything?", 4, &[]).await.unwrap();
        assert_eq!(answer.text, "I don't know.");
        assert!(answer.sources.is_empty());
        assert_eq!(llm.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_window_keeps_latest_turns() {
        let llm = Arc::new(ScriptedLlm::replying("ok"));
        let answerer = answerer_with(llm.clone(), &["some context"]).await;

        let history: Vec<HistoryTurn> = (1..=4)
            .map(|i| HistoryTurn {
                question: format!("question number {}", i),
                answer: format!("answer number {}", i),
            })
            .collect();

        answerer.query("follow up", 1, &history).await.unwrap();

        let prompt = llm.last_prompt();
        assert!(!prompt.contains("question number 1"));
        assert!(!prompt.contains("question number 2"));
        assert!(prompt.contains("question number 3"));
        assert!(prompt.contains("answer number 4"));
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let llm = Arc::new(ScriptedLlm::replying("unused"));
        let answerer = answerer_with(llm.clone(), &["context"]).await;

        let err = answerer.query("   ", 4, &[]).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
        assert!(llm.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_is_generation_error() {
        let llm = Arc::new(ScriptedLlm::failing(|| {
            AppError::rate_limit("scripted", "quota exceeded")
        }));
        let answerer = answerer_with(llm, &["context"]).await;

        let err = answerer.query("question", 4, &[]).await.unwrap_err();
        assert_eq!(err.kind(), "generation_error");
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_search_makes_no_generation_call() {
        let llm = Arc::new(ScriptedLlm::replying("unused"));
        let answerer = answerer_with(llm.clone(), &["alpha beta gamma", "delta epsilon"]).await;

        let hits = answerer.search("alpha beta", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entry.text, "alpha beta gamma");
        assert!(llm.requests.lock().unwrap().is_empty());
    }
}
