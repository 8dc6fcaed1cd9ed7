//! docchat server
//!
//! Answers questions about a folder of markdown documents over HTTP,
//! remembering each conversation by session id.

use clap::Parser;
use docchat_core::config::{AppConfig, ConfigOverrides};
use docchat_core::{logging, AppResult};
use docchat_server::{build_chat_service, run_server, AppState};
use std::path::PathBuf;

/// Conversational Q&A over a markdown corpus
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Conversational Q&A over a markdown document corpus", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "DOCCHAT_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DOCCHAT_PORT")]
    port: Option<u16>,

    /// Directory holding the markdown corpus
    #[arg(short, long, env = "DOCCHAT_DOCUMENTS_DIR")]
    documents_dir: Option<PathBuf>,

    /// Provider for embeddings and generation (gemini, mock)
    #[arg(long, env = "DOCCHAT_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, env = "DOCCHAT_MODEL")]
    model: Option<String>,

    /// Embedding model identifier
    #[arg(long, env = "DOCCHAT_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Chunks retrieved per question
    #[arg(long)]
    top_k: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            documents_dir: self.documents_dir.clone(),
            provider: self.provider.clone(),
            chat_model: self.model.clone(),
            embedding_model: self.embedding_model.clone(),
            top_k: self.top_k,
            log_level: self.log_level.clone(),
            verbose: self.verbose,
            no_color: self.no_color,
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.clone())?.with_overrides(cli.overrides());

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Initializing document chatbot with memory");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Provider: {}", config.provider.name);
    tracing::debug!("Chat model: {}", config.provider.chat_model);

    let result = start(config).await;
    if let Err(e) = &result {
        tracing::error!("Failed to start chatbot: {}", e);
    }
    result
}

async fn start(config: AppConfig) -> AppResult<()> {
    config.validate()?;

    let service = build_chat_service(&config).await?;
    tracing::info!("Chatbot initialized successfully");

    run_server(&config.bind_address(), AppState::new(service)).await
}
