//! Quiz command handler.

use crate::commands::{load_base_corpus, print_json};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tutor_core::{config::AppConfig, AppResult};
use tutor_knowledge::config as kb_config;
use tutor_quiz::{generate_quiz, QuizRequest, DEFAULT_DIFFICULTY, DEFAULT_QUIZ_SIZE};

/// Sample a quiz for a topic
#[derive(Args, Debug)]
pub struct QuizCommand {
    /// Topic to match (case-insensitive substring)
    pub topic: String,

    /// Number of questions
    #[arg(long, default_value_t = DEFAULT_QUIZ_SIZE)]
    pub count: usize,

    /// Requested difficulty
    #[arg(long, default_value = DEFAULT_DIFFICULTY)]
    pub difficulty: String,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QuizCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing quiz command for topic '{}'", self.topic);

        let base = kb_config::load_config(&config.workspace, &config.base)?;
        let records = load_base_corpus(config, &base)?;

        let request = QuizRequest {
            topic: self.topic.clone(),
            difficulty: self.difficulty.clone(),
            count: self.count,
        };
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let quiz = generate_quiz(&records, &request, &mut rng);

        if self.json {
            print_json(&serde_json::json!({ "quiz": quiz }))?;
        } else {
            for (i, record) in quiz.iter().enumerate() {
                println!(
                    "{}. [{}] {}",
                    i + 1,
                    record.topic.as_deref().unwrap_or("General"),
                    record.prompt.as_deref().unwrap_or("")
                );
                for (label, text) in &record.choices {
                    println!("   {}) {}", label, text);
                }
            }
        }

        Ok(())
    }
}
