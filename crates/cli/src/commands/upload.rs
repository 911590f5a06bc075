//! Upload command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_knowledge::{KnowledgeBase, UploadReport};
use std::path::{Path, PathBuf};

/// Add documents to the knowledge base
#[derive(Args, Debug)]
pub struct UploadCommand {
    /// Files to upload (PDF, Markdown or plain text)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl UploadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let kb = KnowledgeBase::open(config).await?;

        let mut reports: Vec<UploadReport> = Vec::new();
        let mut failures: Vec<(PathBuf, AppError)> = Vec::new();

        for path in &self.files {
            match upload_file(&kb, path).await {
                Ok(report) => {
                    if !self.json {
                        println!(
                            "✓ {} ({} chunks, {} bytes)",
                            report.filename, report.chunks, report.size
                        );
                    }
                    reports.push(report);
                }
                Err(e) => {
                    if !self.json {
                        eprintln!("✗ {}: {}", path.display(), e);
                    }
                    failures.push((path.clone(), e));
                }
            }
        }

        if self.json {
            let output = serde_json::json!({
                "uploaded": reports,
                "failed": failures
                    .iter()
                    .map(|(path, e)| serde_json::json!({
                        "path": path.display().to_string(),
                        "kind": e.kind(),
                        "message": e.to_string(),
                    }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        match failures.len() {
            0 => Ok(()),
            1 if self.files.len() == 1 => Err(failures.remove(0).1),
            n => Err(AppError::Other(format!(
                "{} of {} files failed to upload",
                n,
                self.files.len()
            ))),
        }
    }
}

async fn upload_file(kb: &KnowledgeBase, path: &Path) -> AppResult<UploadReport> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::InvalidInput(format!("Not a file path: {}", path.display())))?;

    let bytes = tokio::fs::read(path).await?;
    kb.upload(&bytes, filename).await
}
