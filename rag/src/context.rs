//! Context block formatting for answer prompts.

use crate::types::{Hit, Scope};

pub const DEFAULT_CONTEXT_BUDGET: usize = 4000;

/// Formatted hits, individually and joined for a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledContext {
    pub blocks: Vec<String>,
    /// Blocks separated by a blank line, cut to the character budget
    pub joined: String,
}

/// Renders hits as labelled text blocks within a character budget.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    budget: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_BUDGET)
    }
}

impl ContextAssembler {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn assemble(&self, hits: &[Hit]) -> AssembledContext {
        let blocks: Vec<String> = hits.iter().map(format_block).collect();
        let joined = truncate_chars(&blocks.join("\n\n"), self.budget);
        AssembledContext { blocks, joined }
    }
}

/// ```text
/// [LESSON] <course_title> → <lesson_title>
/// Tác giả: <author> | URL: <url>
/// Nội dung: <content>
/// ```
fn format_block(hit: &Hit) -> String {
    let record = &hit.record;
    let tag = record.record_type.as_str().to_uppercase();
    let mut heading = format!("[{}] {}", tag, record.course_title);
    if record.record_type == Scope::Lesson && !record.lesson_title.is_empty() {
        heading.push_str(" → ");
        heading.push_str(&record.lesson_title);
    }
    format!(
        "{}\nTác giả: {} | URL: {}\nNội dung: {}",
        heading, record.author, record.url, record.content
    )
}

/// Keep at most `max` chars, never splitting one.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
