//! Vector index abstraction and backends.
//!
//! The pipeline only reads from an index: it issues filtered nearest-neighbour
//! searches and never mutates records. Scores are cosine similarities
//! (higher is better) on every backend.

mod memory;

#[cfg(feature = "lance")]
mod lance;

pub use memory::{IndexedRecord, MemoryIndex, cosine_similarity};

#[cfg(feature = "lance")]
pub use lance::{DEFAULT_TABLE_NAME, LanceIndex};

use async_trait::async_trait;

use crate::error::RagError;
use crate::types::{CourseRecord, Hit, Scope};

/// Filtered nearest-neighbour search over catalog records.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `limit` records matching `filter`, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<Hit>, RagError>;

    /// Dimensionality of the stored vectors.
    fn dimensions(&self) -> usize;
}

/// Scalar record attributes a caller may add to the scope filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    CourseId,
    LessonId,
    Author,
    Category,
}

impl FilterField {
    pub fn column(&self) -> &'static str {
        match self {
            FilterField::CourseId => "course_id",
            FilterField::LessonId => "lesson_id",
            FilterField::Author => "author",
            FilterField::Category => "category",
        }
    }

    fn value_of<'a>(&self, record: &'a CourseRecord) -> &'a str {
        match self {
            FilterField::CourseId => &record.course_id,
            FilterField::LessonId => &record.lesson_id,
            FilterField::Author => &record.author,
            FilterField::Category => &record.category,
        }
    }
}

/// Equality predicate on one record attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: FilterField,
    pub value: String,
}

impl Predicate {
    pub fn eq(field: FilterField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// `type == scope`, optionally AND-ed with one caller predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub scope: Scope,
    pub extra: Option<Predicate>,
}

impl SearchFilter {
    pub fn new(scope: Scope, extra: Option<Predicate>) -> Self {
        Self { scope, extra }
    }

    /// Evaluate the filter against a record.
    pub fn matches(&self, record: &CourseRecord) -> bool {
        record.record_type == self.scope
            && self
                .extra
                .as_ref()
                .is_none_or(|p| p.field.value_of(record) == p.value)
    }

    /// Render the filter as a SQL-style predicate (`type = 'lesson' AND ...`).
    pub fn to_sql(&self) -> String {
        let mut expr = format!("type = '{}'", self.scope.as_str());
        if let Some(ref p) = self.extra {
            expr.push_str(&format!(
                " AND {} = '{}'",
                p.field.column(),
                escape_literal(&p.value)
            ));
        }
        expr
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
