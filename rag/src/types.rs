use std::fmt;

use serde::{Deserialize, Serialize};

/// Retrieval scope: which record subtype a search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Course,
    Lesson,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Course => "course",
            Scope::Lesson => "lesson",
        }
    }

    /// Parse a scope label, tolerating case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "course" => Some(Scope::Course),
            "lesson" => Some(Scope::Lesson),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surface intent of a question, independent of its retrieval scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Price,
    Author,
    Lessons,
    General,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Price => "price",
            TaskType::Author => "author",
            TaskType::Lessons => "lessons",
            TaskType::General => "general",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A course or lesson record as stored in the vector index.
///
/// The embedding lives in the index alongside these fields; it is never
/// carried back on search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// Unique record ID
    pub id: String,
    /// Record subtype; partitions the index into two retrieval scopes
    #[serde(rename = "type")]
    pub record_type: Scope,
    pub course_id: String,
    pub course_title: String,
    /// Empty for course records
    #[serde(default)]
    pub lesson_id: String,
    /// Empty for course records
    #[serde(default)]
    pub lesson_title: String,
    pub author: String,
    #[serde(default)]
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub url: String,
}

/// A record with its similarity score from a single search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub record: CourseRecord,
    /// Similarity; higher is more relevant
    pub score: f32,
}

/// Hits that cleared the relevance threshold, best first.
///
/// An empty result means the search succeeded and nothing was relevant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub hits: Vec<Hit>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn top_score(&self) -> Option<f32> {
        self.hits.first().map(|h| h.score)
    }
}

/// A caller's question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
    /// Number of nearest neighbours to fetch; engine default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl AskRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// The answer returned for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The caller's original question
    pub query: String,
    /// Formatted context blocks the answer was grounded on
    pub contexts: Vec<String>,
    /// Model output
    pub answer: String,
    /// Whether retrieval produced any relevant record
    pub found: bool,
    /// Intent the prompt was tailored to; absent on the fallback path
    pub task_type: Option<TaskType>,
}
