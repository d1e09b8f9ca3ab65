//! Retrieve command handler.

use crate::commands::{open_engine, print_json};
use clap::Args;
use tutor_core::{config::AppConfig, AppResult};

/// Retrieve context for a question
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Question text
    pub question: String,

    /// Number of documents to merge (default from the base config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command for base '{}'", config.base);

        let (_, engine) = open_engine(config).await?;
        let k = self.top_k.unwrap_or_else(|| engine.top_k());
        let response = engine.retrieve_top(&self.question, k).await?;

        if self.json {
            print_json(&response)?;
        } else {
            if response.source_topic.is_empty() {
                println!("Topic: (none)");
            } else {
                println!("Topic: {}", response.source_topic);
            }
            println!("Confidence: {:.2}", response.confidence_score);
            println!();
            println!("{}", response.answer_context);
        }

        Ok(())
    }
}
