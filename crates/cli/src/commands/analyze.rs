//! Analyze command handler.

use crate::commands::print_json;
use clap::Args;
use std::path::PathBuf;
use tutor_core::{AppError, AppResult};
use tutor_quiz::{analyze_performance, ResultItem};

/// Give per-topic feedback on graded answers
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// JSON array of {question_id, topic, is_correct}
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeCommand {
    pub async fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing analyze command for {:?}", self.file);

        let content = std::fs::read_to_string(&self.file)?;
        let results: Vec<ResultItem> = serde_json::from_str(&content).map_err(|e| {
            AppError::Quiz(format!("Invalid results file {:?}: {}", self.file, e))
        })?;

        let feedback = analyze_performance(&results);

        if self.json {
            print_json(&serde_json::json!({ "feedback": feedback }))?;
        } else {
            println!("{}", feedback);
        }

        Ok(())
    }
}
