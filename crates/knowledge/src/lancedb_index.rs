//! LanceDB-backed persistent vector index.

use crate::types::{IndexedDocument, Metadata, QueryHit};
use crate::vector_index::{cosine_distance, rank_hits, VectorIndex};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::database::CreateTableMode;
use lancedb::{Connection, DistanceType, Table};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tutor_core::{AppError, AppResult};

/// Metadata fields stored as their own columns next to the JSON blob.
const METADATA_COLUMNS: [&str; 3] = ["subject", "topic", "solution"];

struct TableState {
    table: Table,
    /// Dimension of the embedding column as stored on disk
    stored_dim: usize,
}

/// Persistent vector index stored as one LanceDB table.
pub struct LanceDbIndex {
    conn: Connection,
    table_name: String,
    embedding_dim: usize,
    state: RwLock<TableState>,
}

impl LanceDbIndex {
    /// Open the table at `db_path`, creating an empty one if it is missing.
    ///
    /// A table stored with a different embedding dimension is opened but
    /// refuses reads and writes until `rebuild` is called.
    pub async fn open(db_path: &Path, table_name: &str, embedding_dim: usize) -> AppResult<Self> {
        std::fs::create_dir_all(db_path).map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to create index directory: {}", e))
        })?;

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri).execute().await.map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to connect to LanceDB: {}", e))
        })?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to list tables: {}", e)))?;

        let state = if table_names.iter().any(|name| name == table_name) {
            let table = conn.open_table(table_name).execute().await.map_err(|e| {
                AppError::IndexUnavailable(format!("Failed to open table '{}': {}", table_name, e))
            })?;
            let stored_dim = stored_dimension(&table).await?;
            if stored_dim != embedding_dim {
                tracing::warn!(
                    "Index '{}' stores {}-dim embeddings but {} are configured; rebuild required",
                    table_name,
                    stored_dim,
                    embedding_dim
                );
            }
            TableState { table, stored_dim }
        } else {
            let table =
                create_empty_table(&conn, table_name, embedding_dim, CreateTableMode::Create)
                    .await?;
            TableState {
                table,
                stored_dim: embedding_dim,
            }
        };

        tracing::debug!("Opened LanceDB index '{}' at {:?}", table_name, db_path);

        Ok(Self {
            conn,
            table_name: table_name.to_string(),
            embedding_dim,
            state: RwLock::new(state),
        })
    }

    fn check_dimension(&self, state: &TableState) -> AppResult<()> {
        if state.stored_dim != self.embedding_dim {
            return Err(AppError::IndexUnavailable(format!(
                "Index '{}' was built with {}-dim embeddings, configured model produces {}; rebuild required",
                self.table_name, state.stored_dim, self.embedding_dim
            )));
        }
        Ok(())
    }

    fn documents_to_batch(&self, documents: &[IndexedDocument]) -> AppResult<RecordBatch> {
        let schema = table_schema(self.embedding_dim);

        let mut flat = Vec::with_capacity(documents.len() * self.embedding_dim);
        for document in documents {
            if document.embedding.len() != self.embedding_dim {
                return Err(AppError::IndexUnavailable(format!(
                    "Embedding dimension mismatch for '{}': expected {}, got {}",
                    document.id,
                    self.embedding_dim,
                    document.embedding.len()
                )));
            }
            flat.extend_from_slice(&document.embedding);
        }

        let embeddings = FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(Float32Array::from(flat)),
            None,
        );

        let metadata_json = documents
            .iter()
            .map(|d| serde_json::to_string(&d.metadata))
            .collect::<Result<Vec<_>, _>>()?;

        let ids = StringArray::from(documents.iter().map(|d| d.id.as_str()).collect::<Vec<_>>());
        let texts =
            StringArray::from(documents.iter().map(|d| d.text.as_str()).collect::<Vec<_>>());
        let [subjects, topics, solutions] = METADATA_COLUMNS.map(|field| {
            StringArray::from(documents.iter().map(|d| d.field(field)).collect::<Vec<_>>())
        });

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(ids),
                Arc::new(texts),
                Arc::new(embeddings),
                Arc::new(subjects),
                Arc::new(topics),
                Arc::new(solutions),
                Arc::new(StringArray::from(metadata_json)),
            ],
        )
        .map_err(|e| AppError::IndexUnavailable(format!("Failed to build record batch: {}", e)))
    }
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    async fn rebuild(&self) -> AppResult<()> {
        let mut state = self.state.write().await;

        // Overwrite replaces rows and schema, so a stale dimension is cleared too.
        let table = create_empty_table(
            &self.conn,
            &self.table_name,
            self.embedding_dim,
            CreateTableMode::Overwrite,
        )
        .await?;
        *state = TableState {
            table,
            stored_dim: self.embedding_dim,
        };

        tracing::info!("Rebuilt LanceDB index '{}'", self.table_name);
        Ok(())
    }

    async fn upsert(&self, documents: &[IndexedDocument]) -> AppResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let state = self.state.write().await;
        self.check_dimension(&state)?;

        let batch = self.documents_to_batch(documents)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        let mut merge = state.table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge.execute(Box::new(reader)).await.map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to upsert documents: {}", e))
        })?;

        tracing::debug!("Upserted {} documents into LanceDB", documents.len());
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> AppResult<Vec<QueryHit>> {
        if vector.len() != self.embedding_dim {
            return Err(AppError::IndexUnavailable(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                vector.len()
            )));
        }

        let state = self.state.read().await;
        self.check_dimension(&state)?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let rows = state
            .table
            .count_rows(None)
            .await
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to count rows: {}", e)))?;
        if rows == 0 {
            return Ok(Vec::new());
        }

        let batches: Vec<RecordBatch> = state
            .table
            .query()
            .nearest_to(vector.to_vec())
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to build query: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to execute query: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to collect results: {}", e)))?;

        let mut hits = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                hits.push(row_to_hit(batch, row, vector)?);
            }
        }

        Ok(rank_hits(hits, k))
    }

    async fn count(&self) -> AppResult<u64> {
        let state = self.state.read().await;
        let rows = state
            .table
            .count_rows(None)
            .await
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to count rows: {}", e)))?;
        Ok(rows as u64)
    }

    fn dimensions(&self) -> usize {
        self.embedding_dim
    }
}

fn table_schema(embedding_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                embedding_dim as i32,
            ),
            false,
        ),
        Field::new("subject", DataType::Utf8, false),
        Field::new("topic", DataType::Utf8, false),
        Field::new("solution", DataType::Utf8, false),
        // Full metadata map as JSON
        Field::new("metadata", DataType::Utf8, false),
    ]))
}

async fn create_empty_table(
    conn: &Connection,
    table_name: &str,
    embedding_dim: usize,
    mode: CreateTableMode,
) -> AppResult<Table> {
    let schema = table_schema(embedding_dim);
    let empty = RecordBatch::new_empty(schema.clone());

    conn.create_table(table_name, RecordBatchIterator::new(vec![Ok(empty)], schema))
        .mode(mode)
        .execute()
        .await
        .map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to create table '{}': {}", table_name, e))
        })
}

async fn stored_dimension(table: &Table) -> AppResult<usize> {
    let schema = table
        .schema()
        .await
        .map_err(|e| AppError::IndexUnavailable(format!("Failed to read table schema: {}", e)))?;

    match schema.field_with_name("embedding").map(|f| f.data_type()) {
        Ok(DataType::FixedSizeList(_, size)) => Ok(*size as usize),
        _ => Err(AppError::IndexUnavailable(
            "Table has no fixed-size embedding column".to_string(),
        )),
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::IndexUnavailable(format!("Invalid '{}' column", name)))
}

/// Read one result row, scoring it against the query vector.
fn row_to_hit(batch: &RecordBatch, row: usize, query: &[f32]) -> AppResult<QueryHit> {
    let id = string_column(batch, "id")?.value(row).to_string();
    let text = string_column(batch, "text")?.value(row).to_string();
    let metadata: Metadata = serde_json::from_str(string_column(batch, "metadata")?.value(row))?;

    let embedding_list = batch
        .column_by_name("embedding")
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or_else(|| AppError::IndexUnavailable("Invalid 'embedding' column".to_string()))?;
    let values = embedding_list.value(row);
    let values = values
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| AppError::IndexUnavailable("Invalid embedding values".to_string()))?;
    let embedding: Vec<f32> = (0..values.len()).map(|i| values.value(i)).collect();

    Ok(QueryHit {
        distance: cosine_distance(query, &embedding),
        id,
        text,
        metadata,
    })
}
