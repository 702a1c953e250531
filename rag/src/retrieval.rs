//! Scoped vector retrieval.
//!
//! Embeds the normalized query, searches the index under a scope filter, and
//! keeps only hits above the relevance threshold. Collaborator failures are
//! returned as errors; they never turn into an empty result.

use std::sync::Arc;

use log::debug;

use crate::embeddings::{Embedder, TextRole};
use crate::error::RagError;
use crate::store::{Predicate, SearchFilter, VectorIndex};
use crate::types::{RetrievalResult, Scope};

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Fetch up to `limit` records of type `scope` scoring strictly above
    /// `threshold`, best first.
    pub async fn retrieve(
        &self,
        query: &str,
        scope: Scope,
        limit: usize,
        threshold: f32,
        extra: Option<Predicate>,
    ) -> Result<RetrievalResult, RagError> {
        if limit == 0 {
            return Ok(RetrievalResult::default());
        }

        let filter = SearchFilter::new(scope, extra);
        let embedding = self.embedder.embed(query, TextRole::Query).await?;

        let expected = self.index.dimensions();
        if embedding.len() != expected {
            return Err(RagError::Index(format!(
                "Embedding model '{}' produced {} dimensions, index expects {}",
                self.embedder.model_name(),
                embedding.len(),
                expected
            )));
        }

        let raw_hits = self.index.search(&embedding, &filter, limit).await?;
        let returned = raw_hits.len();

        if let Some(stray) = raw_hits.iter().find(|h| h.record.record_type != scope) {
            return Err(RagError::Index(format!(
                "Search for {} records returned {} record {}",
                scope, stray.record.record_type, stray.record.id
            )));
        }

        let mut hits: Vec<_> = raw_hits
            .into_iter()
            .filter(|h| h.score > threshold)
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));

        let result = RetrievalResult { hits };
        debug!(
            "Retrieved {}/{} {} hits above {} (top score {:?}) with filter `{}`",
            result.len(),
            returned,
            scope,
            threshold,
            result.top_score(),
            filter.to_sql()
        );
        Ok(result)
    }
}
