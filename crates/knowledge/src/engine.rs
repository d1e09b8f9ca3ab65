//! The retrieval engine: one embedding model, one vector index.
//!
//! Constructed explicitly and shared by reference. Holds no per-query state.

use crate::config;
use crate::corpus::CorpusRecord;
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::ingest::{self, IngestOptions};
use crate::lancedb_index::LanceDbIndex;
use crate::manifest::IndexManifest;
use crate::progress::ProgressReporter;
use crate::rag::{self, ConfidencePolicy, RetrievalResponse, DEFAULT_TOP_K};
use crate::types::{BaseStats, IngestStats, KnowledgeBaseConfig, QueryHit};
use crate::vector_index::VectorIndex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tutor_core::{AppError, AppResult};

pub struct RetrievalEngine {
    base_name: String,
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    ingest: IngestOptions,
    confidence: ConfidencePolicy,
    top_k: usize,
    manifest_path: Option<PathBuf>,

    /// Set while the persisted index was built by a different model
    incompatible: RwLock<Option<String>>,
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("base_name", &self.base_name)
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl RetrievalEngine {
    /// Engine over injected handles, with default batch size, k and
    /// confidence policy.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            base_name: "default".to_string(),
            provider,
            index,
            ingest: IngestOptions::default(),
            confidence: ConfidencePolicy::default(),
            top_k: DEFAULT_TOP_K,
            manifest_path: None,
            incompatible: RwLock::new(None),
        }
    }

    /// Open the persisted engine for a knowledge base in `workspace`.
    ///
    /// Fails with `ModelUnavailable` when the embedding model cannot be
    /// loaded. An index built by another model opens, but refuses queries
    /// until it is rebuilt.
    pub async fn open(workspace: &Path, base: &KnowledgeBaseConfig) -> AppResult<Self> {
        config::validate_config(base)?;

        let embedding = EmbeddingConfig::from(base);
        let provider = create_provider(&embedding).await?;

        let index_path = config::get_index_path(workspace, &base.name);
        let index = LanceDbIndex::open(&index_path, &base.name, embedding.dimensions).await?;

        let manifest_path = config::get_manifest_path(workspace, &base.name);
        let incompatible = match IndexManifest::load(&manifest_path)? {
            Some(manifest) => match manifest.ensure_compatible(&embedding) {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!("Index of '{}' needs a rebuild: {}", base.name, e);
                    Some(e.to_string())
                }
            },
            None => None,
        };

        tracing::info!(
            "Opened knowledge base '{}' ({} / {}, {} dims)",
            base.name,
            provider.provider_name(),
            provider.model_name(),
            provider.dimensions()
        );

        let mut engine = Self::new(provider, Arc::new(index))
            .with_batch_size(base.batch_size as usize)
            .with_top_k(base.top_k as usize);
        engine.base_name = base.name.clone();
        engine.manifest_path = Some(manifest_path);
        engine.incompatible = RwLock::new(incompatible);
        Ok(engine)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.ingest.batch_size = batch_size;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_confidence(mut self, confidence: ConfidencePolicy) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Drop the index and ingest `records` from scratch.
    pub async fn build_index(
        &self,
        records: &[CorpusRecord],
        progress: &ProgressReporter,
    ) -> AppResult<IngestStats> {
        let stats = ingest::build_index(
            records,
            self.provider.as_ref(),
            self.index.as_ref(),
            &self.ingest,
            progress,
        )
        .await?;

        if let Some(path) = &self.manifest_path {
            let embedding = EmbeddingConfig {
                provider: self.provider.provider_name().to_string(),
                model: self.provider.model_name().to_string(),
                dimensions: self.provider.dimensions(),
                ..Default::default()
            };
            IndexManifest::new(&embedding, stats.documents_indexed).save(path)?;
        }
        *self.incompatible.write().await = None;

        Ok(stats)
    }

    /// Retrieve with the engine's default k.
    pub async fn retrieve(&self, question: &str) -> AppResult<RetrievalResponse> {
        self.retrieve_top(question, self.top_k).await
    }

    pub async fn retrieve_top(&self, question: &str, k: usize) -> AppResult<RetrievalResponse> {
        self.ensure_queryable().await.map_err(AppError::into_retrieval)?;
        rag::retrieve(
            self.provider.as_ref(),
            self.index.as_ref(),
            question,
            k,
            self.confidence,
        )
        .await
    }

    /// Raw hits with distances.
    pub async fn search(&self, question: &str, k: usize) -> AppResult<Vec<QueryHit>> {
        self.ensure_queryable().await?;
        rag::search(self.provider.as_ref(), self.index.as_ref(), question, k).await
    }

    pub async fn stats(&self) -> AppResult<BaseStats> {
        let manifest = match &self.manifest_path {
            Some(path) => IndexManifest::load(path)?,
            None => None,
        };

        Ok(BaseStats {
            base_name: self.base_name.clone(),
            documents_count: self.index.count().await?,
            manifest,
        })
    }

    async fn ensure_queryable(&self) -> AppResult<()> {
        match self.incompatible.read().await.as_ref() {
            Some(reason) => Err(AppError::IndexUnavailable(format!(
                "Index must be rebuilt before querying: {}",
                reason
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::memory_index::InMemoryIndex;
    use tempfile::TempDir;

    fn records() -> Vec<CorpusRecord> {
        vec![
            CorpusRecord::new("1", "What is mitosis?", "Mitosis is cell division.")
                .with_topic("Biology"),
            CorpusRecord::new("2", "What is velocity?", "Velocity is speed with direction.")
                .with_topic("Physics"),
        ]
    }

    #[tokio::test]
    async fn test_injected_engine_build_and_retrieve() {
        let engine = RetrievalEngine::new(
            Arc::new(TrigramProvider::new(64)),
            Arc::new(InMemoryIndex::new(64)),
        )
        .with_top_k(1);

        let stats = engine
            .build_index(&records(), &ProgressReporter::noop())
            .await
            .unwrap();
        assert_eq!(stats.documents_indexed, 2);

        let response = engine.retrieve("velocity speed direction").await.unwrap();
        assert_eq!(response.source_topic, "Physics");
        assert!(response.answer_context.starts_with("Question: What is velocity?"));
        assert_eq!(engine.stats().await.unwrap().documents_count, 2);
    }

    #[tokio::test]
    async fn test_confidence_policy_is_replaceable() {
        let engine = RetrievalEngine::new(
            Arc::new(TrigramProvider::new(64)),
            Arc::new(InMemoryIndex::new(64)),
        )
        .with_confidence(ConfidencePolicy::Constant(0.6));

        let empty = engine.retrieve("mitosis").await.unwrap();
        assert_eq!(empty.confidence_score, 0.0);

        engine
            .build_index(&records(), &ProgressReporter::noop())
            .await
            .unwrap();
        let response = engine.retrieve("mitosis cell division").await.unwrap();
        assert_eq!(response.confidence_score, 0.6);
    }

    #[tokio::test]
    async fn test_open_build_and_reopen() {
        let temp = TempDir::new().unwrap();
        let base = KnowledgeBaseConfig {
            name: "exam_knowledge".to_string(),
            embedding_dim: 64,
            ..Default::default()
        };

        let engine = RetrievalEngine::open(temp.path(), &base).await.unwrap();
        engine
            .build_index(&records(), &ProgressReporter::noop())
            .await
            .unwrap();
        drop(engine);

        let engine = RetrievalEngine::open(temp.path(), &base).await.unwrap();
        let stats = engine.stats().await.unwrap();
        assert_eq!(stats.documents_count, 2);
        let manifest = stats.manifest.unwrap();
        assert_eq!(manifest.model, "trigram-v1");
        assert_eq!(manifest.documents, 2);

        let response = engine.retrieve("mitosis cell division").await.unwrap();
        assert_eq!(response.source_topic, "Biology");
    }

    #[tokio::test]
    async fn test_model_change_requires_rebuild() {
        let temp = TempDir::new().unwrap();
        let base = KnowledgeBaseConfig {
            name: "exam_knowledge".to_string(),
            embedding_dim: 64,
            ..Default::default()
        };
        let engine = RetrievalEngine::open(temp.path(), &base).await.unwrap();
        engine
            .build_index(&records(), &ProgressReporter::noop())
            .await
            .unwrap();
        drop(engine);

        let resized = KnowledgeBaseConfig {
            embedding_dim: 32,
            ..base
        };
        let engine = RetrievalEngine::open(temp.path(), &resized).await.unwrap();
        let err = engine.retrieve("mitosis").await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));

        engine
            .build_index(&records(), &ProgressReporter::noop())
            .await
            .unwrap();
        assert!(engine.retrieve("mitosis").await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_provider_is_model_unavailable() {
        let temp = TempDir::new().unwrap();
        let base = KnowledgeBaseConfig {
            name: "exam_knowledge".to_string(),
            provider: "nonexistent".to_string(),
            ..Default::default()
        };

        let err = RetrievalEngine::open(temp.path(), &base).await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
    }
}
