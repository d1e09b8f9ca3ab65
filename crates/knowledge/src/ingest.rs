//! Ingestion: corpus records in, a freshly rebuilt vector index out.
//!
//! Every run drops the index and re-embeds the whole corpus. Batches are
//! upserted sequentially in corpus order.

use crate::corpus::CorpusRecord;
use crate::document::{prepare_documents, DocumentDraft, MetadataPolicy};
use crate::embeddings::EmbeddingProvider;
use crate::progress::{Phase, ProgressReporter};
use crate::types::{IndexedDocument, IngestStats};
use crate::vector_index::VectorIndex;
use std::time::Instant;
use tutor_core::{AppError, AppResult};

/// Documents per upsert call.
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub batch_size: usize,
    pub policy: MetadataPolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            policy: MetadataPolicy::default(),
        }
    }
}

/// Rebuild `index` from `records`.
///
/// Records without a prompt or lecture are dropped. An embedding failure
/// aborts the run; a failed upsert is logged and counted in
/// `batches_failed` while the remaining batches continue.
pub async fn build_index(
    records: &[CorpusRecord],
    provider: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
    options: &IngestOptions,
    progress: &ProgressReporter,
) -> AppResult<IngestStats> {
    if options.batch_size == 0 {
        return Err(AppError::Config("batch_size must be at least 1".to_string()));
    }

    let start = Instant::now();
    let prepared = prepare_documents(records, &options.policy);

    tracing::info!(
        "Filtered corpus: {} records, {} eligible, {} dropped",
        records.len(),
        prepared.drafts.len(),
        prepared.dropped
    );
    progress.emit(
        Phase::Filter,
        prepared.drafts.len() as u64,
        Some(records.len() as u64),
        format!("{} records dropped", prepared.dropped),
    );

    index.rebuild().await?;
    progress.emit(Phase::Rebuild, 1, Some(1), "Index recreated");

    let batches: Vec<&[DocumentDraft]> = prepared.drafts.chunks(options.batch_size).collect();
    let batches_total = batches.len();

    let mut stats = IngestStats {
        records_total: records.len() as u32,
        records_dropped: prepared.dropped,
        batches_total: batches_total as u32,
        ..Default::default()
    };

    for (i, batch) in batches.into_iter().enumerate() {
        let batch_no = i + 1;
        let documents = embed_batch(provider, batch).await?;
        progress.emit(
            Phase::Embed,
            batch_no as u64,
            Some(batches_total as u64),
            format!("Embedded {} documents", documents.len()),
        );

        match index.upsert(&documents).await {
            Ok(()) => {
                stats.documents_indexed += documents.len() as u32;
                tracing::info!("Added batch {}/{}", batch_no, batches_total);
                progress.emit(
                    Phase::Index,
                    batch_no as u64,
                    Some(batches_total as u64),
                    format!("Added batch {}/{}", batch_no, batches_total),
                );
            }
            Err(e) => {
                stats.batches_failed += 1;
                tracing::warn!("Batch {}/{} failed: {}", batch_no, batches_total, e);
                progress.emit(
                    Phase::Index,
                    batch_no as u64,
                    Some(batches_total as u64),
                    format!("Batch {}/{} failed", batch_no, batches_total),
                );
            }
        }
    }

    stats.duration_secs = start.elapsed().as_secs_f64();

    tracing::info!(
        "Ingestion finished: {} documents in {}/{} batches ({:.2}s)",
        stats.documents_indexed,
        stats.batches_total - stats.batches_failed,
        stats.batches_total,
        stats.duration_secs
    );

    Ok(stats)
}

async fn embed_batch(
    provider: &dyn EmbeddingProvider,
    batch: &[DocumentDraft],
) -> AppResult<Vec<IndexedDocument>> {
    let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
    let embeddings = provider.embed_batch(&texts).await?;

    if embeddings.len() != batch.len() {
        return Err(AppError::ModelUnavailable(format!(
            "Model returned {} embeddings for {} documents",
            embeddings.len(),
            batch.len()
        )));
    }

    Ok(batch
        .iter()
        .zip(embeddings)
        .map(|(draft, embedding)| IndexedDocument {
            id: draft.id.clone(),
            embedding,
            text: draft.text.clone(),
            metadata: draft.metadata.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use crate::memory_index::InMemoryIndex;
    use crate::types::QueryHit;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Index whose every other upsert fails.
    struct FlakyIndex {
        inner: InMemoryIndex,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl VectorIndex for FlakyIndex {
        async fn rebuild(&self) -> AppResult<()> {
            self.inner.rebuild().await
        }

        async fn upsert(&self, documents: &[IndexedDocument]) -> AppResult<()> {
            if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
                return Err(AppError::IndexUnavailable("disk full".to_string()));
            }
            self.inner.upsert(documents).await
        }

        async fn query(&self, vector: &[f32], k: usize) -> AppResult<Vec<QueryHit>> {
            self.inner.query(vector, k).await
        }

        async fn count(&self) -> AppResult<u64> {
            self.inner.count().await
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }
    }

    fn corpus(n: usize) -> Vec<CorpusRecord> {
        (0..n)
            .map(|i| CorpusRecord::new(i.to_string(), format!("prompt {}", i), "lecture"))
            .collect()
    }

    #[tokio::test]
    async fn test_batches_partition_in_order() {
        let provider = TrigramProvider::new(32);
        let index = InMemoryIndex::new(32);
        let options = IngestOptions {
            batch_size: 2,
            ..Default::default()
        };

        let stats = build_index(&corpus(5), &provider, &index, &options, &ProgressReporter::noop())
            .await
            .unwrap();

        assert_eq!(stats.records_total, 5);
        assert_eq!(stats.batches_total, 3);
        assert_eq!(stats.documents_indexed, 5);
        assert!(stats.is_complete());
        assert_eq!(index.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_failed_batch_is_counted_and_skipped() {
        let provider = TrigramProvider::new(32);
        let index = FlakyIndex {
            inner: InMemoryIndex::new(32),
            calls: AtomicUsize::new(0),
        };
        let options = IngestOptions {
            batch_size: 2,
            ..Default::default()
        };

        let stats = build_index(&corpus(6), &provider, &index, &options, &ProgressReporter::noop())
            .await
            .unwrap();

        assert_eq!(stats.batches_total, 3);
        assert_eq!(stats.batches_failed, 1);
        assert_eq!(stats.documents_indexed, 4);
        assert!(!stats.is_complete());
        assert_eq!(index.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_progress_reports_each_batch() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let progress = ProgressReporter::new(Arc::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        let provider = TrigramProvider::new(16);
        let index = InMemoryIndex::new(16);
        let options = IngestOptions {
            batch_size: 1,
            ..Default::default()
        };
        build_index(&corpus(2), &provider, &index, &options, &progress)
            .await
            .unwrap();

        let events = events.lock().unwrap();
        let index_events: Vec<_> = events.iter().filter(|e| e.phase == Phase::Index).collect();
        assert_eq!(index_events.len(), 2);
        assert_eq!(index_events[1].message, "Added batch 2/2");
        assert_eq!(events[0].phase, Phase::Filter);
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let provider = TrigramProvider::new(16);
        let index = InMemoryIndex::new(16);
        let options = IngestOptions {
            batch_size: 0,
            ..Default::default()
        };

        let result =
            build_index(&corpus(1), &provider, &index, &options, &ProgressReporter::noop()).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
