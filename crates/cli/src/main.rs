//! Exam tutor CLI
//!
//! Main entry point for the tutor command-line tool: builds the knowledge
//! index, answers retrieval queries, samples quizzes and serves the HTTP API.

mod commands;
mod server;

use clap::{Parser, Subcommand};
use commands::{
    AnalyzeCommand, BuildCommand, QuizCommand, RetrieveCommand, ServeCommand, StatsCommand,
};
use std::path::PathBuf;
use tutor_core::{config::AppConfig, logging, AppResult};

/// Exam tutor - semantic retrieval over exam questions and lecture notes
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(about = "Semantic retrieval over exam questions and lecture notes", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "TUTOR_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "TUTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Knowledge base name
    #[arg(short, long, global = true, env = "TUTOR_BASE")]
    base: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the knowledge index from the cleaned corpus
    Build(BuildCommand),

    /// Retrieve context for a question
    Retrieve(RetrieveCommand),

    /// Sample a quiz for a topic
    Quiz(QuizCommand),

    /// Give per-topic feedback on graded answers
    Analyze(AnalyzeCommand),

    /// Show knowledge base statistics
    Stats(StatsCommand),

    /// Serve the HTTP API
    Serve(ServeCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;

    let bind = match &cli.command {
        Commands::Serve(cmd) => cmd.bind.clone(),
        _ => None,
    };
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.base,
        bind,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Exam tutor starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Knowledge base: {}", config.base);

    config.ensure_tutor_dir()?;

    let command_name = match &cli.command {
        Commands::Build(_) => "build",
        Commands::Retrieve(_) => "retrieve",
        Commands::Quiz(_) => "quiz",
        Commands::Analyze(_) => "analyze",
        Commands::Stats(_) => "stats",
        Commands::Serve(_) => "serve",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Build(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Quiz(cmd) => cmd.execute(&config).await,
        Commands::Analyze(cmd) => cmd.execute().await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
