//! Answer prompts and composition.
//!
//! Two paths: when retrieval found nothing the model gets a fallback prompt
//! with just the question; otherwise it gets the formatted context plus one
//! directive for the detected intent. Either way the answer service is
//! called exactly once.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::completion::CompletionService;
use crate::context::ContextAssembler;
use crate::error::RagError;
use crate::types::{Answer, RetrievalResult, TaskType};

/// Prompt text used for answer composition.
///
/// `{query}` and `{context}` are substituted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub base: String,
    pub fallback: String,
    pub price_directive: String,
    pub author_directive: String,
    pub lessons_directive: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            base: "Bạn là trợ lý AI cho hệ thống khóa học.\n\
                   Người dùng hỏi: \"{query}\"\n\n\
                   Dựa trên dữ liệu trong các khóa học:\n\
                   {context}\n\n\
                   Hãy trả lời ngắn gọn, chính xác, và chỉ dựa vào thông tin trên."
                .to_string(),
            fallback: "Bạn là trợ lý AI cho hệ thống khóa học.\n\
                       Người dùng hỏi: \"{query}\"\n\n\
                       Hệ thống không tìm thấy khóa học hoặc bài học nào liên quan đến câu hỏi này.\n\
                       Hãy lịch sự thông báo cho người dùng rằng chưa có thông tin phù hợp \
                       và gợi ý họ hỏi lại cụ thể hơn. Không được bịa ra khóa học hay bài học."
                .to_string(),
            price_directive: "Người dùng hỏi về giá hoặc học phí. Chỉ nêu giá nếu dữ liệu có ghi; \
                              nếu không, hãy nói rõ là dữ liệu chưa có thông tin giá."
                .to_string(),
            author_directive: "Người dùng hỏi về tác giả hoặc giảng viên. \
                               Nêu tên tác giả và khóa học tương ứng."
                .to_string(),
            lessons_directive: "Người dùng hỏi về bài học hoặc nội dung khóa học. \
                                Liệt kê các bài học liên quan, mỗi bài một dòng, kèm tên khóa học."
                .to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn directive(&self, task_type: TaskType) -> Option<&str> {
        match task_type {
            TaskType::Price => Some(&self.price_directive),
            TaskType::Author => Some(&self.author_directive),
            TaskType::Lessons => Some(&self.lessons_directive),
            TaskType::General => None,
        }
    }

    pub fn render_fallback(&self, query: &str) -> String {
        self.fallback.replace("{query}", query)
    }

    pub fn render_found(&self, query: &str, context: &str, task_type: TaskType) -> String {
        // Substitute context last so braces inside the query are never re-expanded.
        let mut prompt = self
            .base
            .replace("{query}", &query.replace("{context}", "{ context}"))
            .replace("{context}", context);
        if let Some(directive) = self.directive(task_type) {
            prompt.push_str("\n\n");
            prompt.push_str(directive);
        }
        prompt
    }
}

/// Builds the final prompt and calls the answer service once.
pub struct AnswerComposer {
    service: Arc<dyn CompletionService>,
    assembler: ContextAssembler,
    templates: PromptTemplates,
}

impl AnswerComposer {
    pub fn new(
        service: Arc<dyn CompletionService>,
        assembler: ContextAssembler,
        templates: PromptTemplates,
    ) -> Self {
        Self {
            service,
            assembler,
            templates,
        }
    }

    pub async fn compose(
        &self,
        raw_query: &str,
        retrieval: RetrievalResult,
        task_type: TaskType,
    ) -> Result<Answer, RagError> {
        if retrieval.is_empty() {
            let prompt = self.templates.render_fallback(raw_query);
            debug!("Fallback prompt ({} chars)", prompt.chars().count());
            let answer = self.service.complete(&prompt).await?;
            return Ok(Answer {
                query: raw_query.to_string(),
                contexts: Vec::new(),
                answer,
                found: false,
                task_type: None,
            });
        }

        let context = self.assembler.assemble(&retrieval.hits);
        let prompt = self
            .templates
            .render_found(raw_query, &context.joined, task_type);
        debug!(
            "Answer prompt for {} intent: {} blocks, {} chars",
            task_type,
            context.blocks.len(),
            prompt.chars().count()
        );
        let answer = self.service.complete(&prompt).await?;

        Ok(Answer {
            query: raw_query.to_string(),
            contexts: context.blocks,
            answer,
            found: true,
            task_type: Some(task_type),
        })
    }
}
