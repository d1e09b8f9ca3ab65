//! Query pipeline: embed the question, fetch the nearest documents and merge
//! them into one context block.

use crate::embeddings::EmbeddingProvider;
use crate::rag::types::{ConfidencePolicy, RetrievalResponse};
use crate::types::QueryHit;
use crate::vector_index::VectorIndex;
use tutor_core::AppResult;

/// Documents merged into a context when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 2;

/// Nearest documents to `question`, ascending distance.
pub async fn search(
    provider: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
    question: &str,
    k: usize,
) -> AppResult<Vec<QueryHit>> {
    let vector = provider.embed(question).await?;
    let hits = index.query(&vector, k).await?;

    if let Some(top) = hits.first() {
        tracing::debug!(
            "Retrieved {} documents (top: '{}', distance {:.3})",
            hits.len(),
            top.id,
            top.distance
        );
    }

    Ok(hits)
}

/// Answer `question` with the merged context of its `k` nearest documents.
///
/// Model and index failures come back as a single `AppError::Retrieval`.
pub async fn retrieve(
    provider: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
    question: &str,
    k: usize,
    confidence: ConfidencePolicy,
) -> AppResult<RetrievalResponse> {
    let hits = search(provider, index, question, k)
        .await
        .map_err(|e| {
            tracing::error!("Retrieval failed: {}", e);
            e.into_retrieval()
        })?;

    Ok(build_response(&hits, confidence))
}

/// Merge hits into a response. The topic comes from the nearest hit alone.
pub fn build_response(hits: &[QueryHit], confidence: ConfidencePolicy) -> RetrievalResponse {
    let Some(top) = hits.first() else {
        tracing::info!("No documents matched the question");
        return RetrievalResponse::no_information();
    };

    let answer_context = hits
        .iter()
        .map(|hit| hit.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    RetrievalResponse {
        answer_context,
        source_topic: top.topic().to_string(),
        confidence_score: confidence.score(),
    }
}
