//! Build command handler.
//!
//! Rebuilds the knowledge index from the cleaned corpus.

use crate::commands::print_json;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tutor_core::{config::AppConfig, AppError, AppResult};
use tutor_knowledge::{config as kb_config, IngestStats, ProgressReporter, RetrievalEngine};

/// Rebuild the knowledge index
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Cleaned corpus file (JSON array of records)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Documents per upsert batch
    #[arg(long)]
    pub batch_size: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing build command for base '{}'", config.base);

        let mut base = kb_config::load_config(&config.workspace, &config.base)?;
        if let Some(corpus) = &self.corpus {
            base.corpus_path = corpus.to_string_lossy().to_string();
        }
        if let Some(batch_size) = self.batch_size {
            base.batch_size = batch_size;
        }
        kb_config::save_config(&config.workspace, &base)?;

        let records = super::load_base_corpus(config, &base)?;
        let engine = RetrievalEngine::open(&config.workspace, &base).await?;

        let progress = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event| eprintln!("{}", event.format_simple())))
        };

        let stats = engine.build_index(&records, &progress).await?;

        if self.json {
            print_json(&serde_json::json!({
                "base": base.name,
                "recordsTotal": stats.records_total,
                "recordsDropped": stats.records_dropped,
                "documentsIndexed": stats.documents_indexed,
                "batchesTotal": stats.batches_total,
                "batchesFailed": stats.batches_failed,
                "durationSecs": stats.duration_secs,
            }))?;
        } else {
            println!(
                "Indexed {} documents from {} records ({} dropped) in {:.2}s",
                stats.documents_indexed,
                stats.records_total,
                stats.records_dropped,
                stats.duration_secs
            );
        }

        ensure_complete(&stats)
    }
}

/// A build with failed batches leaves a partial index and must exit non-zero.
fn ensure_complete(stats: &IngestStats) -> AppResult<()> {
    if stats.is_complete() {
        return Ok(());
    }

    Err(AppError::IndexUnavailable(format!(
        "{} of {} batches failed to index",
        stats.batches_failed, stats.batches_total
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tutor_knowledge::embeddings::providers::TrigramProvider;
    use tutor_knowledge::{CorpusRecord, InMemoryIndex};

    const CORPUS: &str = r#"[
        {"id": 1, "prompt": "What is mitosis?", "lecture": "Mitosis is cell division.", "topic": "Biology"},
        {"id": 2, "prompt": "What is velocity?", "lecture": "Velocity is directed speed.", "topic": "Physics"},
        {"id": 3, "prompt": "What is osmosis?", "lecture": null}
    ]"#;

    #[tokio::test]
    async fn test_failed_batches_fail_the_build() {
        // Vectors of the wrong width are rejected by every upsert.
        let engine = RetrievalEngine::new(
            Arc::new(TrigramProvider::new(64)),
            Arc::new(InMemoryIndex::new(32)),
        )
        .with_batch_size(1);
        let records = vec![
            CorpusRecord::new("1", "What is mitosis?", "Mitosis is cell division."),
            CorpusRecord::new("2", "What is velocity?", "Velocity is directed speed."),
        ];

        let stats = engine
            .build_index(&records, &ProgressReporter::noop())
            .await
            .unwrap();
        assert_eq!(stats.batches_failed, 2);

        let err = ensure_complete(&stats).unwrap_err();
        assert!(matches!(err, AppError::IndexUnavailable(_)));
        assert!(err.to_string().contains("2 of 2 batches"));
    }

    #[test]
    fn test_complete_build_passes() {
        let stats = IngestStats {
            batches_total: 3,
            batches_failed: 0,
            ..Default::default()
        };
        assert!(ensure_complete(&stats).is_ok());
    }

    #[tokio::test]
    async fn test_execute_builds_and_saves_base_config() {
        let temp = TempDir::new().unwrap();
        let corpus = temp.path().join("cleaned_exam.json");
        std::fs::write(&corpus, CORPUS).unwrap();

        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..Default::default()
        };
        let command = BuildCommand {
            corpus: Some(corpus.clone()),
            batch_size: Some(1),
            json: true,
        };
        command.execute(&config).await.unwrap();

        let base = kb_config::load_config(temp.path(), &config.base).unwrap();
        assert_eq!(base.batch_size, 1);
        assert_eq!(base.corpus_path, corpus.to_string_lossy());

        let engine = RetrievalEngine::open(temp.path(), &base).await.unwrap();
        assert_eq!(engine.stats().await.unwrap().documents_count, 2);
    }
}
