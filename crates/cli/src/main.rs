//! docsift CLI
//!
//! Main entry point for the docsift command-line tool: run the retrieval
//! HTTP service, inspect how a file is chunked, or search a set of files.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ChunkCommand, ServeCommand};
use docsift_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// docsift - document chunking, embedding and similarity search
#[derive(Parser, Debug)]
#[command(name = "docsift")]
#[command(about = "Document chunking, embedding and similarity search", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCSIFT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCSIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Embedding provider (openai, gemini, ollama, mock, or a configured name)
    #[arg(short, long, global = true, env = "DOCSIFT_PROVIDER")]
    provider: Option<String>,

    /// Embedding model identifier
    #[arg(short, long, global = true, env = "DOCSIFT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Print the chunks a file would be split into
    Chunk(ChunkCommand),

    /// Index files in memory and search them
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())
        .context("Failed to load configuration")?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)
        .context("Failed to initialize logging")?;

    tracing::info!("docsift starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Chunk(_) => "chunk",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(config).await,
        Commands::Chunk(cmd) => cmd.execute(&config),
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("docsift {} failed", command_name))
}
