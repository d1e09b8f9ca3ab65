//! Semantic knowledge retrieval over an exam corpus.
//!
//! Corpus records are embedded into a vector index once; questions are then
//! answered with the merged text of their nearest documents and the topic of
//! the closest one.

pub mod config;
pub mod corpus;
pub mod document;
pub mod embeddings;
pub mod engine;
pub mod ingest;
pub mod lancedb_index;
pub mod manifest;
pub mod memory_index;
pub mod progress;
pub mod rag;
pub mod types;
pub mod vector_index;


// Re-export commonly used types
pub use corpus::{load_corpus, parse_corpus, CorpusRecord};
pub use document::MetadataPolicy;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use engine::RetrievalEngine;
pub use ingest::IngestOptions;
pub use memory_index::InMemoryIndex;
pub use progress::{Phase, ProgressEvent, ProgressReporter};
pub use rag::{ConfidencePolicy, RetrievalResponse};
pub use types::{BaseStats, IndexedDocument, IngestStats, KnowledgeBaseConfig, QueryHit};
pub use vector_index::VectorIndex;
