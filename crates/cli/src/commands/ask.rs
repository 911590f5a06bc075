//! Ask and search command handlers.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::{truncate_snippet, KnowledgeBase};

/// Ask a question about the uploaded documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let kb = KnowledgeBase::open(config).await?;
        let answer = kb.query(&self.question, self.k, &[]).await?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": answer.text,
                "sources": answer.sources,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{}", answer.text.trim());

        if !answer.sources.is_empty() {
            println!("\nSources:");
            for (i, source) in answer.sources.iter().enumerate() {
                println!(
                    "  [{}] {} #{} ({:.3}): {}",
                    i + 1,
                    source.metadata.source,
                    source.metadata.chunk_id,
                    source.score,
                    one_line(&source.snippet(kb.snippet_length()))
                );
            }
        }

        Ok(())
    }
}

/// Find the chunks most similar to a query, without generating an answer
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Search query
    pub query: String,

    /// Number of chunks to return (default from config)
    #[arg(short = 'k', long)]
    pub k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let kb = KnowledgeBase::open(config).await?;
        let hits = kb.search(&self.query, self.k).await?;

        if self.json {
            let output: Vec<_> = hits
                .iter()
                .map(|hit| {
                    serde_json::json!({
                        "content": hit.entry.text,
                        "metadata": hit.entry.metadata,
                        "similarity_score": hit.score,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if hits.is_empty() {
            println!("No documents indexed.");
            return Ok(());
        }

        for (i, hit) in hits.iter().enumerate() {
            println!(
                "{}. {} #{} (score {:.3})\n   {}",
                i + 1,
                hit.entry.metadata.source,
                hit.entry.metadata.chunk_id,
                hit.score,
                one_line(&truncate_snippet(&hit.entry.text, kb.snippet_length()))
            );
        }

        Ok(())
    }
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
