//! docqa CLI
//!
//! Main entry point for the docqa command-line tool. Every subcommand works on
//! the knowledge base stored in the workspace's `.docqa` directory; `serve`
//! exposes the same operations over HTTP.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, ClearCommand, DocumentsCommand, SearchCommand, ServeCommand, StatusCommand,
    UploadCommand,
};
use docqa_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;
use tracing::Instrument;

/// docqa - question answering over your documents
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Upload PDF documents and ask questions about them", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.docqa/config.yaml)
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API and web UI
    Serve(ServeCommand),

    /// Add documents to the knowledge base
    Upload(UploadCommand),

    /// Ask a question about the uploaded documents
    Ask(AskCommand),

    /// Find the chunks most similar to a query, without generating an answer
    Search(SearchCommand),

    /// Show index and backend status
    Status(StatusCommand),

    /// List uploaded documents
    Documents(DocumentsCommand),

    /// Remove every document from the knowledge base
    Clear(ClearCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // The workspace decides which config file is read; logging flags win over it
    let mut config = AppConfig::default()
        .with_overrides(cli.workspace, cli.config, None, false, false)
        .load_from_workspace()?
        .with_overrides(None, None, cli.log_level, cli.verbose, cli.no_color);
    if cli.log_json {
        config.log_json = true;
    }

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("docqa starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding backend: {} ({})",
        config.embedding.backend.name(),
        config.embedding.backend.model()
    );
    tracing::debug!(
        "LLM backend: {} ({})",
        config.llm.backend.name(),
        config.llm.backend.model()
    );

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Upload(_) => "upload",
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Status(_) => "status",
        Commands::Documents(_) => "documents",
        Commands::Clear(_) => "clear",
    };
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match cli.command {
            Commands::Serve(cmd) => cmd.execute(&config).await,
            Commands::Upload(cmd) => cmd.execute(&config).await,
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Search(cmd) => cmd.execute(&config).await,
            Commands::Status(cmd) => cmd.execute(&config).await,
            Commands::Documents(cmd) => cmd.execute(&config).await,
            Commands::Clear(cmd) => cmd.execute(&config).await,
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!(kind = e.kind(), "Command failed: {}", e),
    }

    result
}
