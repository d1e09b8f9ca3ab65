//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat document metadata. Values are never null.
pub type Metadata = BTreeMap<String, String>;

/// Configuration for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeBaseConfig {
    /// Name of the knowledge base (also the index table name)
    pub name: String,

    /// Embedding provider: "trigram" or "ollama"
    pub provider: String,

    /// Embedding model identifier
    pub model: String,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: u32,

    /// Documents per upsert call
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Number of documents merged into a retrieval context
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Cleaned corpus file, relative to the workspace
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Embedding server URL for HTTP providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_embedding_dim() -> u32 {
    384
}

fn default_batch_size() -> u32 {
    500
}

fn default_top_k() -> u32 {
    2
}

fn default_corpus_path() -> String {
    "data/cleaned_exam.json".to_string()
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            embedding_dim: default_embedding_dim(),
            batch_size: default_batch_size(),
            top_k: default_top_k(),
            corpus_path: default_corpus_path(),
            endpoint: None,
        }
    }
}

/// The unit stored in a vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedDocument {
    /// Upsert key, equal to the corpus record id
    pub id: String,

    /// Embedding of `text`
    pub embedding: Vec<f32>,

    /// `Question: {prompt} Context: {lecture}`
    pub text: String,

    pub metadata: Metadata,
}

impl IndexedDocument {
    /// Metadata field lookup returning an empty string when absent.
    pub fn field(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or("")
    }
}

/// A single k-NN result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryHit {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,

    /// Cosine distance to the query vector (0.0 = identical direction)
    pub distance: f32,
}

impl QueryHit {
    pub fn topic(&self) -> &str {
        self.metadata.get("topic").map(String::as_str).unwrap_or("")
    }
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IngestStats {
    /// Records in the input corpus
    pub records_total: u32,

    /// Records dropped for missing prompt or lecture
    pub records_dropped: u32,

    /// Documents written by successful batches
    pub documents_indexed: u32,

    pub batches_total: u32,

    /// Batches whose upsert failed
    pub batches_failed: u32,

    pub duration_secs: f64,
}

impl IngestStats {
    /// True when every batch was applied.
    pub fn is_complete(&self) -> bool {
        self.batches_failed == 0
    }
}

/// Statistics for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStats {
    pub base_name: String,
    pub documents_count: u64,
    pub manifest: Option<crate::manifest::IndexManifest>,
}
