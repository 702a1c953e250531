//! In-memory brute-force cosine index.
//!
//! Immutable once built, so concurrent searches need no locking. Suitable
//! for tests and catalogs small enough to scan per query.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SearchFilter, VectorIndex};
use crate::error::RagError;
use crate::types::{CourseRecord, Hit};

/// A catalog record together with its stored embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedRecord {
    #[serde(flatten)]
    pub record: CourseRecord,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    dimensions: usize,
    records: Vec<IndexedRecord>,
}

/// Brute-force cosine-similarity index over a fixed record set.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    dims: usize,
    records: Vec<IndexedRecord>,
}

impl MemoryIndex {
    /// Build an index, rejecting any record whose vector has the wrong length.
    pub fn new(dims: usize, records: Vec<IndexedRecord>) -> Result<Self, RagError> {
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != dims) {
            return Err(RagError::Index(format!(
                "Record {} has {} dimensions, index expects {}",
                bad.record.id,
                bad.embedding.len(),
                dims
            )));
        }
        Ok(Self { dims, records })
    }

    /// Load a JSON snapshot: `{"dimensions": N, "records": [{..., "embedding": [...]}]}`.
    pub fn load_snapshot(path: &Path) -> Result<Self, RagError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RagError::Index(format!("Failed to read snapshot {}: {e}", path.display()))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&contents).map_err(|e| {
            RagError::Index(format!("Failed to parse snapshot {}: {e}", path.display()))
        })?;
        Self::new(snapshot.dimensions, snapshot.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn search(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<Hit>, RagError> {
        if query_embedding.len() != self.dims {
            return Err(RagError::Index(format!(
                "Query has {} dimensions, index expects {}",
                query_embedding.len(),
                self.dims
            )));
        }

        let mut hits: Vec<Hit> = self
            .records
            .iter()
            .filter(|r| filter.matches(&r.record))
            .map(|r| Hit {
                record: r.record.clone(),
                score: cosine_similarity(&r.embedding, query_embedding),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Cosine similarity of two equal-length vectors.
/// Returns 0.0 when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())) as f32
}
