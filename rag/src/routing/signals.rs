//! Regex-based intent classification.
//!
//! Each intent has one word-boundary pattern over Vietnamese and English
//! keywords. Intents are checked in a fixed order and the first hit wins, so
//! a question about both price and author is a price question.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use crate::types::TaskType;

/// Classify a query string into a TaskType.
///
/// Deterministic and total: anything without a keyword hit is `General`.
pub fn classify_intent(query: &str) -> TaskType {
    let normalized: String = query.nfc().collect::<String>().to_lowercase();

    let priceable = NOT_PRICE_RE.replace_all(&normalized, " ");

    if PRICE_RE.is_match(&priceable) {
        TaskType::Price
    } else if AUTHOR_RE.is_match(&normalized) {
        TaskType::Author
    } else if LESSONS_RE.is_match(&normalized) {
        TaskType::Lessons
    } else {
        TaskType::General
    }
}

// --- Regex patterns (compiled once) ---
//
// `\b` is Unicode-aware, so "giá" does not match inside "giáo".
// Compounds where "giá" is a separate word but not a price ("đánh giá",
// "giá trị") are blanked out before the price match.

static NOT_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(đánh\s+giá|giá\s+trị)\b").unwrap()
});

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(giá|học\s+phí|chi\s+phí|bao\s+nhiêu\s+tiền|phí|price|cost|fee|tuition|how\s+much)\b")
        .unwrap()
});

static AUTHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(tác\s+giả|giảng\s+viên|giáo\s+viên|người\s+dạy|ai\s+dạy|author|instructor|teacher|who\s+teaches|who\s+created)\b")
        .unwrap()
});

static LESSONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(bài\s+học|bài\s+giảng|lessons?|chương|nội\s+dung|giáo\s+trình|curriculum|syllabus|modules?)\b")
        .unwrap()
});
