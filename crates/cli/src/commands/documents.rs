//! Status, documents and clear command handlers.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::KnowledgeBase;

/// Show index and backend status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let kb = KnowledgeBase::open(config).await?;
        let status = kb.status().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(());
        }

        println!("Workspace:  {}", config.workspace.display());
        println!("Documents:  {}", status.document_count);
        println!("Chunks:     {}", status.entry_count);
        println!(
            "Embeddings: {} / {} ({} dimensions, {})",
            status.embedding_backend,
            status.embedding_model,
            status.dimension,
            status.metric.as_str()
        );
        println!("LLM:        {} / {}", status.llm_backend, status.llm_model);

        Ok(())
    }
}

/// List uploaded documents
#[derive(Args, Debug)]
pub struct DocumentsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocumentsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let kb = KnowledgeBase::open(config).await?;
        let documents = kb.documents()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&documents)?);
            return Ok(());
        }

        if documents.is_empty() {
            println!("No documents uploaded.");
            return Ok(());
        }

        for doc in &documents {
            println!(
                "{}  {:<8} {:>4} pages {:>5} chunks {:>9} bytes  {}",
                doc.indexed_at.format("%Y-%m-%d %H:%M"),
                doc.file_type,
                doc.pages,
                doc.chunks,
                doc.bytes,
                doc.filename
            );
        }
        println!("{} documents", documents.len());

        Ok(())
    }
}

/// Remove every document from the knowledge base
#[derive(Args, Debug)]
pub struct ClearCommand {}

impl ClearCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let kb = KnowledgeBase::open(config).await?;
        kb.clear().await?;
        println!("All documents cleared.");
        Ok(())
    }
}
