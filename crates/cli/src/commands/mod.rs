//! Command handlers for the exam tutor CLI.

pub mod analyze;
pub mod build;
pub mod quiz;
pub mod retrieve;
pub mod serve;
pub mod stats;

pub use analyze::AnalyzeCommand;
pub use build::BuildCommand;
pub use quiz::QuizCommand;
pub use retrieve::RetrieveCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;

use tutor_core::{config::AppConfig, AppError, AppResult};
use tutor_knowledge::{config as kb_config, CorpusRecord, KnowledgeBaseConfig, RetrievalEngine};

/// Open the engine of the configured knowledge base.
pub async fn open_engine(config: &AppConfig) -> AppResult<(KnowledgeBaseConfig, RetrievalEngine)> {
    let base = kb_config::load_config(&config.workspace, &config.base)?;
    let engine = RetrievalEngine::open(&config.workspace, &base).await?;
    Ok((base, engine))
}

/// Load the corpus a knowledge base was configured with.
pub fn load_base_corpus(config: &AppConfig, base: &KnowledgeBaseConfig) -> AppResult<Vec<CorpusRecord>> {
    let path = kb_config::get_corpus_path(&config.workspace, base);
    tutor_knowledge::load_corpus(&path)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(format!("JSON serialization failed: {}", e)))?;
    println!("{}", output);
    Ok(())
}
