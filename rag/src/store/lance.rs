//! LanceDB-backed catalog index.
//!
//! Reads the `course_rag` table written by the indexing job. Searches use
//! cosine distance; LanceDB reports `_distance = 1 - cos`, which is turned
//! back into a similarity so thresholds mean the same thing as on
//! [`MemoryIndex`](super::MemoryIndex).

use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::DistanceType;
use lancedb::query::{ExecutableQuery, QueryBase};

use super::{SearchFilter, VectorIndex};
use crate::error::RagError;
use crate::types::{CourseRecord, Hit, Scope};

pub const DEFAULT_TABLE_NAME: &str = "course_rag";

const TEXT_COLUMNS: [&str; 10] = [
    "id",
    "type",
    "course_id",
    "course_title",
    "lesson_id",
    "lesson_title",
    "author",
    "category",
    "content",
    "url",
];

/// LanceDB table of course and lesson records.
pub struct LanceIndex {
    table: lancedb::Table,
    dims: usize,
}

impl LanceIndex {
    /// Open an existing table. The table is never created or modified here.
    pub async fn open(path: &str, table_name: &str, dims: usize) -> Result<Self, RagError> {
        let db = lancedb::connect(path)
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to connect to {path}: {e}")))?;
        let table = db
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to open table {table_name}: {e}")))?;
        Ok(Self { table, dims })
    }

    fn rows_to_hits(batch: &RecordBatch, hits: &mut Vec<Hit>) -> Result<(), RagError> {
        let column = |name: &str| {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| RagError::Index(format!("Search result missing column '{name}'")))
        };
        let ids = column("id")?;
        let types = column("type")?;
        let course_ids = column("course_id")?;
        let course_titles = column("course_title")?;
        let lesson_ids = column("lesson_id")?;
        let lesson_titles = column("lesson_title")?;
        let authors = column("author")?;
        let categories = column("category")?;
        let contents = column("content")?;
        let urls = column("url")?;
        let distances = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| RagError::Index("Search result missing _distance".to_string()))?;

        for i in 0..batch.num_rows() {
            let record_type = Scope::parse(types.value(i)).ok_or_else(|| {
                RagError::Index(format!(
                    "Record {} has unknown type '{}'",
                    ids.value(i),
                    types.value(i)
                ))
            })?;
            let distance = if distances.is_null(i) {
                1.0
            } else {
                distances.value(i)
            };

            hits.push(Hit {
                record: CourseRecord {
                    id: ids.value(i).to_string(),
                    record_type,
                    course_id: course_ids.value(i).to_string(),
                    course_title: course_titles.value(i).to_string(),
                    lesson_id: lesson_ids.value(i).to_string(),
                    lesson_title: lesson_titles.value(i).to_string(),
                    author: authors.value(i).to_string(),
                    category: categories.value(i).to_string(),
                    content: contents.value(i).to_string(),
                    url: urls.value(i).to_string(),
                },
                score: 1.0 - distance,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for LanceIndex {
    async fn search(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<Hit>, RagError> {
        let query = self
            .table
            .vector_search(query_embedding)
            .map_err(|e| RagError::Index(format!("Failed to build search query: {e}")))?
            .distance_type(DistanceType::Cosine)
            .only_if(filter.to_sql())
            .limit(limit);

        let batches: Vec<RecordBatch> = query
            .execute()
            .await
            .map_err(|e| RagError::Index(format!("Failed to execute search: {e}")))?
            .try_collect()
            .await
            .map_err(|e| RagError::Index(format!("Failed to read search results: {e}")))?;

        let mut hits = Vec::new();
        for batch in &batches {
            Self::rows_to_hits(batch, &mut hits)?;
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(hits)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}
