//! Vector index abstraction.
//!
//! Backends store `IndexedDocument`s keyed by id and answer k-NN queries
//! under cosine distance.

use crate::types::{IndexedDocument, QueryHit};
use std::cmp::Ordering;
use tutor_core::AppResult;

/// Trait for vector index backends.
///
/// Implementations must:
/// - serialize concurrent writes internally
/// - return hits sorted by ascending distance, ties broken by id
/// - answer an empty index with an empty result, not an error
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Drop all contents, leaving a fresh empty index. Idempotent.
    async fn rebuild(&self) -> AppResult<()>;

    /// Insert or overwrite documents by id.
    ///
    /// A failure part way through may leave the batch partially applied.
    async fn upsert(&self, documents: &[IndexedDocument]) -> AppResult<()>;

    /// Return up to `k` nearest documents to `vector`.
    async fn query(&self, vector: &[f32], k: usize) -> AppResult<Vec<QueryHit>>;

    /// Number of stored documents.
    async fn count(&self) -> AppResult<u64>;

    /// Embedding dimension accepted by this index.
    fn dimensions(&self) -> usize;
}

/// Cosine distance: `1 - cos(a, b)`. Zero vectors are at distance 1.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}

/// Sort hits nearest first and keep `k`.
pub fn rank_hits(mut hits: Vec<QueryHit>, k: usize) -> Vec<QueryHit> {
    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.truncate(k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    fn hit(id: &str, distance: f32) -> QueryHit {
        QueryHit {
            id: id.to_string(),
            text: String::new(),
            metadata: Metadata::new(),
            distance,
        }
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_rank_hits_orders_and_truncates() {
        let ranked = rank_hits(vec![hit("c", 0.5), hit("a", 0.1), hit("b", 0.3)], 2);
        let ids: Vec<&str> = ranked.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_rank_hits_breaks_ties_by_id() {
        let ranked = rank_hits(vec![hit("z", 0.2), hit("m", 0.2), hit("a", 0.4)], 3);
        let ids: Vec<&str> = ranked.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["m", "z", "a"]);
    }
}
