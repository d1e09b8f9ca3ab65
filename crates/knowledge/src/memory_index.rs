//! In-memory vector index.
//!
//! Exact k-NN over a `HashMap` guarded by a `tokio::sync::RwLock`. Used for
//! tests and for engines that do not need persistence.

use crate::types::{IndexedDocument, QueryHit};
use crate::vector_index::{cosine_distance, rank_hits, VectorIndex};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tutor_core::{AppError, AppResult};

#[derive(Debug)]
pub struct InMemoryIndex {
    dimensions: usize,
    documents: RwLock<HashMap<String, IndexedDocument>>,
}

impl InMemoryIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a stored document by id.
    pub async fn get(&self, id: &str) -> Option<IndexedDocument> {
        self.documents.read().await.get(id).cloned()
    }
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    async fn rebuild(&self) -> AppResult<()> {
        self.documents.write().await.clear();
        tracing::debug!("Rebuilt in-memory index");
        Ok(())
    }

    async fn upsert(&self, documents: &[IndexedDocument]) -> AppResult<()> {
        let mut store = self.documents.write().await;
        for document in documents {
            if document.embedding.len() != self.dimensions {
                return Err(AppError::IndexUnavailable(format!(
                    "Embedding dimension mismatch for '{}': expected {}, got {}",
                    document.id,
                    self.dimensions,
                    document.embedding.len()
                )));
            }
            store.insert(document.id.clone(), document.clone());
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> AppResult<Vec<QueryHit>> {
        if vector.len() != self.dimensions {
            return Err(AppError::IndexUnavailable(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimensions,
                vector.len()
            )));
        }

        let store = self.documents.read().await;
        let hits = store
            .values()
            .map(|doc| QueryHit {
                id: doc.id.clone(),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                distance: cosine_distance(vector, &doc.embedding),
            })
            .collect();

        Ok(rank_hits(hits, k))
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.documents.read().await.len() as u64)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    fn doc(id: &str, embedding: Vec<f32>, topic: &str) -> IndexedDocument {
        let mut metadata = Metadata::new();
        metadata.insert("topic".to_string(), topic.to_string());
        IndexedDocument {
            id: id.to_string(),
            embedding,
            text: format!("text {}", id),
            metadata,
        }
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty_result() {
        let index = InMemoryIndex::new(2);
        let hits = index.query(&[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_query_orders_by_distance() {
        let index = InMemoryIndex::new(2);
        index
            .upsert(&[
                doc("far", vec![0.0, 1.0], "Physics"),
                doc("near", vec![1.0, 0.1], "Biology"),
            ])
            .await
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[1].id, "far");
        assert!(hits[0].distance < hits[1].distance);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let index = InMemoryIndex::new(2);
        index.upsert(&[doc("1", vec![1.0, 0.0], "Old")]).await.unwrap();
        index.upsert(&[doc("1", vec![0.0, 1.0], "New")]).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        assert_eq!(index.get("1").await.unwrap().field("topic"), "New");
    }

    #[tokio::test]
    async fn test_rebuild_clears() {
        let index = InMemoryIndex::new(2);
        index.upsert(&[doc("1", vec![1.0, 0.0], "T")]).await.unwrap();
        index.rebuild().await.unwrap();
        index.rebuild().await.unwrap();

        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let index = InMemoryIndex::new(3);
        assert!(index.upsert(&[doc("1", vec![1.0], "T")]).await.is_err());
        assert!(index.query(&[1.0], 1).await.is_err());
    }
}
