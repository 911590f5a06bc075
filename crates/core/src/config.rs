//! Configuration management for docqa.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.docqa/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with all state stored in `.docqa/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the state directory inside the workspace.
pub const STATE_DIR: &str = ".docqa";

const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    pub ingest: IngestConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub server: ServerConfig,
}

/// Document ingestion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestConfig {
    /// Target chunk length in characters
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,

    /// Maximum accepted upload size in bytes
    pub max_file_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Embedding backend selection. The set of backends is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Hosted OpenAI-compatible embeddings API
    #[serde(rename = "openai", rename_all = "camelCase")]
    OpenAi {
        model: String,
        dimensions: usize,
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        #[serde(default)]
        endpoint: Option<String>,
    },

    /// Local Ollama runtime
    #[serde(rename_all = "camelCase")]
    Ollama {
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        model: String,
        dimensions: usize,
    },

    /// Deterministic on-device hashing embedder (offline use and tests)
    Trigram { dimensions: usize },
}

impl EmbeddingBackend {
    /// Canonical backend name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Ollama { .. } => "ollama",
            Self::Trigram { .. } => "trigram",
        }
    }

    /// Model identifier for this backend.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi { model, .. } | Self::Ollama { model, .. } => model,
            Self::Trigram { .. } => "trigram-v1",
        }
    }

    /// Declared vector dimension.
    pub fn dimensions(&self) -> usize {
        match self {
            Self::OpenAi { dimensions, .. }
            | Self::Ollama { dimensions, .. }
            | Self::Trigram { dimensions } => *dimensions,
        }
    }
}

/// Embedding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,

    /// Maximum texts sent per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-request timeout for hosted/local backends
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama {
                endpoint: DEFAULT_OLLAMA_ENDPOINT.to_string(),
                model: "nomic-embed-text".to_string(),
                dimensions: 768,
            },
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Language model backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LlmBackend {
    /// Hosted OpenAI-compatible chat completions API
    #[serde(rename = "openai", rename_all = "camelCase")]
    OpenAi {
        model: String,
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        #[serde(default)]
        endpoint: Option<String>,
    },

    /// Local Ollama runtime
    #[serde(rename_all = "camelCase")]
    Ollama {
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        model: String,
    },
}

impl LlmBackend {
    /// Canonical backend name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Ollama { .. } => "ollama",
        }
    }

    /// Model identifier for this backend.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi { model, .. } | Self::Ollama { model, .. } => model,
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    pub backend: LlmBackend,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama {
                endpoint: DEFAULT_OLLAMA_ENDPOINT.to_string(),
                model: "llama3.2".to_string(),
            },
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Similarity metric used by the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    InnerProduct,
}

impl SimilarityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::InnerProduct => "inner_product",
        }
    }
}

/// Retrieval and answering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalConfig {
    /// Default number of chunks retrieved per question
    pub search_k: usize,

    /// Conversation turns serialized into the prompt
    pub max_history_turns: usize,

    pub metric: SimilarityMetric,

    /// Characters of source text shown in API responses
    pub snippet_length: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_k: 4,
            max_history_turns: 3,
            metric: SimilarityMetric::Cosine,
            snippet_length: 200,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    ingest: Option<IngestConfig>,
    embedding: Option<EmbeddingConfig>,
    llm: Option<LlmConfig>,
    retrieval: Option<RetrievalConfig>,
    server: Option<ServerConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_ollama_endpoint() -> String {
    DEFAULT_OLLAMA_ENDPOINT.to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            ingest: IngestConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read the workspace config file and apply the environment on top.
    ///
    /// The config file is `config_file` when set, otherwise
    /// `<workspace>/.docqa/config.yaml` if it exists. Environment variables:
    /// - `DOCQA_HOST` / `DOCQA_PORT`: HTTP bind address
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// `DOCQA_WORKSPACE` and `DOCQA_CONFIG` are read by the CLI and arrive
    /// through [`AppConfig::with_overrides`].
    pub fn load_from_workspace(self) -> AppResult<Self> {
        if !self.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                self.workspace
            )));
        }

        let config_path = self
            .config_file
            .clone()
            .unwrap_or_else(|| self.state_dir().join("config.yaml"));

        let mut config = if config_path.exists() {
            self.merge_yaml(&config_path)?
        } else if self.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        } else {
            self
        };

        // Environment variables override YAML config
        if let Ok(host) = std::env::var("DOCQA_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("DOCQA_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid DOCQA_PORT: {}", port)))?;
        }

        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents)?
        };

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(ingest) = config_file.ingest {
            result.ingest = ingest;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(server) = config_file.server {
            result.server = server;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and config file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Path to the .docqa directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Directory holding the persisted vector index and document registry.
    pub fn index_dir(&self) -> PathBuf {
        self.state_dir().join("vector_db")
    }

    /// Directory searched for prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.state_dir().join("prompts")
    }

    /// Ensure the .docqa directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Resolve an API key from the named environment variable.
    pub fn resolve_api_key(env_var: &str) -> Option<String> {
        std::env::var(env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration values that would otherwise fail deep in the pipeline.
    pub fn validate(&self) -> AppResult<()> {
        if self.ingest.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be greater than 0".to_string()));
        }

        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }

        if self.embedding.backend.dimensions() == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than 0".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config("batchSize must be greater than 0".to_string()));
        }

        if self.retrieval.search_k == 0 {
            return Err(AppError::Config("searchK must be greater than 0".to_string()));
        }

        Ok(())
    }
}
