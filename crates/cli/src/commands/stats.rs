//! Stats command handler.

use crate::commands::{open_engine, print_json};
use clap::Args;
use tutor_core::{config::AppConfig, AppResult};

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command for base '{}'", config.base);

        let (base, engine) = open_engine(config).await?;
        let stats = engine.stats().await?;

        if self.json {
            print_json(&stats)?;
            return Ok(());
        }

        println!("Knowledge base: {}", stats.base_name);
        println!("Documents: {}", stats.documents_count);
        println!("Embedding: {} / {} ({} dims)", base.provider, base.model, base.embedding_dim);
        match &stats.manifest {
            Some(manifest) => println!(
                "Last build: {} ({} / {})",
                manifest.built_at.to_rfc3339(),
                manifest.provider,
                manifest.model
            ),
            None => println!("Last build: never"),
        }

        Ok(())
    }
}
