//! Serve command handler.

use crate::commands::{load_base_corpus, open_engine};
use crate::server::{self, ServerState};
use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;
use tutor_core::{config::AppConfig, AppError, AppResult};
use tutor_knowledge::{CorpusRecord, KnowledgeBaseConfig};

/// Serve the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (host:port)
    #[arg(long, env = "TUTOR_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let (base, engine) = open_engine(config).await?;
        let records = load_quiz_corpus(config, &base);

        let state = ServerState {
            engine: Arc::new(engine),
            corpus: Arc::new(records),
        };

        let addr: SocketAddr = config
            .bind
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid bind address '{}': {}", config.bind, e)))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Listening on http://{}", addr);

        axum::serve(listener, server::router(state)).await?;
        Ok(())
    }
}

/// The quiz corpus is optional for serving; without it quizzes come back empty.
fn load_quiz_corpus(config: &AppConfig, base: &KnowledgeBaseConfig) -> Vec<CorpusRecord> {
    match load_base_corpus(config, base) {
        Ok(records) => {
            tracing::info!("Quiz corpus loaded: {} questions available", records.len());
            records
        }
        Err(e) => {
            tracing::warn!("Serving without a quiz corpus: {}", e);
            Vec::new()
        }
    }
}
