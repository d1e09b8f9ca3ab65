//! Random quiz selection by topic.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tutor_knowledge::CorpusRecord;

pub const DEFAULT_QUIZ_SIZE: usize = 5;

pub const DEFAULT_DIFFICULTY: &str = "Medium";

/// Parameters of a quiz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizRequest {
    pub topic: String,

    /// Recorded with the request; selection does not depend on it
    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}

fn default_count() -> usize {
    DEFAULT_QUIZ_SIZE
}

impl QuizRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            difficulty: default_difficulty(),
            count: DEFAULT_QUIZ_SIZE,
        }
    }
}

/// Sample up to `request.count` distinct records whose topic contains
/// `request.topic`, ignoring case.
///
/// When no record matches, the whole corpus is sampled instead.
pub fn generate_quiz<R: Rng + ?Sized>(
    records: &[CorpusRecord],
    request: &QuizRequest,
    rng: &mut R,
) -> Vec<CorpusRecord> {
    if records.is_empty() {
        tracing::warn!("Quiz requested but the corpus is empty");
        return Vec::new();
    }

    let needle = request.topic.to_lowercase();
    let mut pool: Vec<&CorpusRecord> = records
        .iter()
        .filter(|r| {
            r.topic
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect();

    if pool.is_empty() {
        tracing::warn!(
            "No questions found for topic '{}', sampling the whole corpus",
            request.topic
        );
        pool = records.iter().collect();
    }

    let size = request.count.min(pool.len());
    let quiz: Vec<CorpusRecord> = pool
        .choose_multiple(rng, size)
        .map(|r| (*r).clone())
        .collect();

    tracing::debug!(
        topic = %request.topic,
        difficulty = %request.difficulty,
        "Generated quiz of {} questions from {} candidates",
        quiz.len(),
        pool.len()
    );

    quiz
}
