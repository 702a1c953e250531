//! Query classification and intent routing.
//!
//! A [`QueryClassifier`] turns a raw user question into a normalized query
//! plus a retrieval [`Scope`]. [`classify_intent`] independently decides the
//! surface intent used to pick an answer directive. Classification never
//! fails: anything it cannot decide falls back to the raw query and
//! `Scope::Course`.

mod signals;

pub use signals::classify_intent;

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use log::{debug, warn};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::completion::CompletionService;
use crate::types::Scope;

/// Output of a [`QueryClassifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedQuery {
    /// Query text used for embedding.
    pub query: String,
    pub scope: Scope,
    /// True when classification failed and fallbacks were used.
    pub degraded: bool,
}

impl ClassifiedQuery {
    fn fallback(raw_query: &str) -> Self {
        Self {
            query: raw_query.to_string(),
            scope: Scope::Course,
            degraded: true,
        }
    }
}

/// Rewrites a question for retrieval and picks its scope.
#[async_trait]
pub trait QueryClassifier: Send + Sync {
    async fn classify(&self, raw_query: &str) -> ClassifiedQuery;
}

/// Substrings that mark a question as being about lessons rather than courses.
const LESSON_KEYWORDS: [&str; 9] = [
    "bài học",
    "bài giảng",
    "lesson",
    "chương",
    "phần",
    "nội dung",
    "cách học",
    "hướng dẫn",
    "ví dụ",
];

static LEADING_FILLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(xin\s+chào|chào\s+bạn|cho\s+mình\s+hỏi|cho\s+tôi\s+hỏi|cho\s+em\s+hỏi|bạn\s+ơi|ad\s+ơi|làm\s+ơn|please|can\s+you\s+tell\s+me|could\s+you\s+tell\s+me|tell\s+me|hello|hi)\b[\s,.!:;]*")
        .unwrap()
});

static TRAILING_FILLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\s,]+(vậy|ạ|nhé|thế|nhỉ)(?P<punct>[\s?.!]*)$").unwrap()
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Deterministic classifier: NFC normalization, filler stripping, and a
/// lesson keyword check.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a question for embedding. Returns an empty string when
    /// nothing but filler remains.
    pub fn rewrite(raw_query: &str) -> String {
        let nfc: String = raw_query.nfc().collect();
        let mut text = WHITESPACE_RE.replace_all(nfc.trim(), " ").into_owned();

        loop {
            let stripped = LEADING_FILLER_RE.replace(&text, "");
            let stripped = TRAILING_FILLER_RE.replace(&stripped, "$punct");
            let stripped = stripped.trim().to_string();
            if stripped == text {
                break;
            }
            text = stripped;
        }
        text
    }

    /// `Lesson` when the query mentions any lesson keyword.
    pub fn scope_of(query: &str) -> Scope {
        let lower = query.to_lowercase();
        if LESSON_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            Scope::Lesson
        } else {
            Scope::Course
        }
    }
}

#[async_trait]
impl QueryClassifier for KeywordClassifier {
    async fn classify(&self, raw_query: &str) -> ClassifiedQuery {
        let rewritten = Self::rewrite(raw_query);
        let query = if rewritten.is_empty() {
            raw_query.to_string()
        } else {
            rewritten
        };
        let scope = Self::scope_of(&query);
        debug!("Classified '{}' as {} (keyword)", query, scope);
        ClassifiedQuery {
            query,
            scope,
            degraded: false,
        }
    }
}

const CLASSIFIER_PROMPT: &str = "Bạn là bộ phân loại câu hỏi cho hệ thống khóa học.\n\
Viết lại câu hỏi sau thành một câu truy vấn ngắn gọn, rõ ràng để tìm kiếm, \
và cho biết câu hỏi nói về khóa học (course) hay bài học (lesson).\n\n\
Câu hỏi: \"{query}\"\n\n\
Trả lời đúng hai dòng theo định dạng:\n\
query: <câu truy vấn đã viết lại>\n\
scope: <course hoặc lesson>";

/// Classifier backed by a completion service.
///
/// Uses its own service instance so that answer composition still makes
/// exactly one call on the answer service per request.
pub struct ModelClassifier {
    service: Arc<dyn CompletionService>,
}

impl ModelClassifier {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Parse a `query: ... / scope: ...` reply.
    ///
    /// Labels are accepted with or without the `scope:` prefix and in any case.
    fn parse_reply(reply: &str) -> (Option<String>, Option<Scope>) {
        let mut query = None;
        let mut scope = None;

        for line in reply.lines() {
            let line = line.trim().trim_matches('`').trim();
            if line.is_empty() {
                continue;
            }
            let lower = line.to_lowercase();
            if let Some(rest) = lower.strip_prefix("scope:") {
                scope = scope.or_else(|| Scope::parse(rest.trim_matches(|c: char| !c.is_alphanumeric())));
            } else if lower.starts_with("query:") {
                let text = line.get("query:".len()..).unwrap_or_default();
                let text = text.trim().trim_matches('"').trim();
                if !text.is_empty() && query.is_none() {
                    query = Some(text.to_string());
                }
            } else if scope.is_none() {
                scope = Scope::parse(line.trim_matches(|c: char| !c.is_alphanumeric()));
            }
        }
        (query, scope)
    }
}

#[async_trait]
impl QueryClassifier for ModelClassifier {
    async fn classify(&self, raw_query: &str) -> ClassifiedQuery {
        let prompt = CLASSIFIER_PROMPT.replace("{query}", raw_query);
        let reply = match self.service.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Query classification degraded, using raw query: {}", e);
                return ClassifiedQuery::fallback(raw_query);
            }
        };

        let (query, scope) = Self::parse_reply(&reply);
        let degraded = query.is_none() || scope.is_none();
        if degraded {
            warn!(
                "Query classification degraded (rewrite: {}, label: {})",
                if query.is_some() { "ok" } else { "missing" },
                if scope.is_some() { "ok" } else { "missing" }
            );
        }

        let classified = ClassifiedQuery {
            query: query.unwrap_or_else(|| raw_query.to_string()),
            scope: scope.unwrap_or(Scope::Course),
            degraded,
        };
        debug!(
            "Classified '{}' as {} (model)",
            classified.query, classified.scope
        );
        classified
    }
}
