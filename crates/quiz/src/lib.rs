//! Quiz sampling and performance feedback over the exam corpus.
//!
//! Works on flat corpus records; no embeddings involved.

pub mod feedback;
pub mod generate;

pub use feedback::{analyze_performance, ResultItem, NO_DATA};
pub use generate::{generate_quiz, QuizRequest, DEFAULT_DIFFICULTY, DEFAULT_QUIZ_SIZE};
