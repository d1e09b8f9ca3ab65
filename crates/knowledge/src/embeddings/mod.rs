//! Embedding model adapter.
//!
//! Providers turn text into fixed-length vectors. Ingestion and querying
//! must go through the same provider so both sides live in one vector space.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, normalize, EmbeddingProvider};
