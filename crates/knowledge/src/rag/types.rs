//! Retrieval response types.

use serde::{Deserialize, Serialize};

/// Context returned when the index has nothing to offer.
pub const NO_INFORMATION: &str = "No relevant textbook info found.";

/// How the confidence score of a response is produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfidencePolicy {
    /// Attach the same score to every non-empty response.
    Constant(f32),
}

impl ConfidencePolicy {
    pub fn score(&self) -> f32 {
        match self {
            ConfidencePolicy::Constant(score) => *score,
        }
    }
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        ConfidencePolicy::Constant(0.95)
    }
}

/// Context handed to the tutor for a single question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResponse {
    /// Document texts of the hits, nearest first, joined by a space
    pub answer_context: String,

    /// Topic of the nearest hit
    pub source_topic: String,

    pub confidence_score: f32,
}

impl RetrievalResponse {
    /// Sentinel for a query that matched nothing.
    pub fn no_information() -> Self {
        Self {
            answer_context: NO_INFORMATION.to_string(),
            source_topic: String::new(),
            confidence_score: 0.0,
        }
    }

    pub fn is_no_information(&self) -> bool {
        self.source_topic.is_empty() && self.answer_context == NO_INFORMATION
    }
}
