//! Serve command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_knowledge::KnowledgeBase;
use std::sync::Arc;

/// Run the HTTP API and web UI
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (default from config: 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (default from config: 8000)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let host = self.host.as_deref().unwrap_or(&config.server.host);
        let port = self.port.unwrap_or(config.server.port);

        let kb = Arc::new(KnowledgeBase::open(config).await?);
        let status = kb.status().await?;
        tracing::info!(
            entries = status.entry_count,
            documents = status.document_count,
            "Knowledge base ready"
        );

        println!("Serving docqa on http://{}:{} (Ctrl+C to stop)", host, port);

        docqa_server::serve(kb, host, port)
            .await
            .map_err(|e| AppError::Other(format!("Server error: {:#}", e)))
    }
}
