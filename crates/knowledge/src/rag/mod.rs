//! Retrieval over an indexed exam corpus.
//!
//! Turns a free-text question into a context block and a topic for the
//! tutor. No generation happens here.

pub mod retrieve;
pub mod types;

pub use retrieve::{build_response, retrieve, search, DEFAULT_TOP_K};
pub use types::{ConfidencePolicy, RetrievalResponse, NO_INFORMATION};
