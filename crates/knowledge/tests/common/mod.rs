//! Shared fixtures for knowledge base integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use docqa_core::config::{IngestConfig, RetrievalConfig};
use docqa_core::AppResult;
use docqa_knowledge::embeddings::providers::TrigramProvider;
use docqa_knowledge::{AnswerSettings, KnowledgeBase, KnowledgeBaseParts};
use docqa_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const DIM: usize = 256;

/// Language model stand-in that echoes a fixed answer and keeps every prompt.
#[derive(Default)]
pub struct RecordingLlm {
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingLlm {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for RecordingLlm {
    fn provider_name(&self) -> &str {
        "recording"
    }

    fn model_name(&self) -> &str {
        "recording-1"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        Ok(LlmResponse {
            content: "scripted answer".to_string(),
            model: "recording-1".to_string(),
            usage: LlmUsage::new(10, 2),
        })
    }
}

pub fn ingest_config(chunk_size: usize, chunk_overlap: usize) -> IngestConfig {
    IngestConfig {
        chunk_size,
        chunk_overlap,
        ..Default::default()
    }
}

pub async fn open_kb(dir: &Path, ingest: IngestConfig, llm: Arc<RecordingLlm>) -> KnowledgeBase {
    let parts = KnowledgeBaseParts {
        ingest,
        retrieval: RetrievalConfig::default(),
        answer: AnswerSettings::default(),
        embedder: Arc::new(TrigramProvider::new(DIM)),
        llm,
        prompt: docqa_prompt::default_prompt().unwrap(),
    };
    KnowledgeBase::from_parts(parts, dir).await.unwrap()
}

/// Build an in-memory PDF with one text line per page.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 11.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
