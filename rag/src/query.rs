//! RAG query orchestrator.
//!
//! Runs one question through classification, scoped retrieval, intent
//! routing, and answer composition, in that order.

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::completion::CompletionService;
use crate::context::{ContextAssembler, DEFAULT_CONTEXT_BUDGET};
use crate::embeddings::Embedder;
use crate::error::RagError;
use crate::prompt::{AnswerComposer, PromptTemplates};
use crate::retrieval::Retriever;
use crate::routing::{QueryClassifier, classify_intent};
use crate::store::{Predicate, VectorIndex};
use crate::types::{Answer, AskRequest};

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Neighbours fetched when a request does not say
    pub default_top_k: usize,
    /// Upper bound on any request's `top_k`
    pub max_top_k: usize,
    /// Cosine similarity a hit must strictly exceed
    pub relevance_threshold: f32,
    /// Character budget for the joined context
    pub context_budget: usize,
    pub prompts: PromptTemplates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_top_k: 3,
            max_top_k: 20,
            relevance_threshold: 0.25,
            context_budget: DEFAULT_CONTEXT_BUDGET,
            prompts: PromptTemplates::default(),
        }
    }
}

impl EngineConfig {
    /// Resolve a request's `top_k` into `1..=max_top_k`.
    pub fn effective_top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_top_k)
            .clamp(1, self.max_top_k.max(1))
    }
}

/// External services the engine depends on.
///
/// `answer_service` must not be shared with a model-backed classifier if
/// callers rely on one answer-service call per request.
pub struct Collaborators {
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub classifier: Arc<dyn QueryClassifier>,
    pub answer_service: Arc<dyn CompletionService>,
}

/// Answers catalog questions. Holds no mutable state, so one engine can
/// serve concurrent requests.
pub struct RagEngine {
    classifier: Arc<dyn QueryClassifier>,
    retriever: Retriever,
    composer: AnswerComposer,
    config: EngineConfig,
}

impl RagEngine {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        let Collaborators {
            embedder,
            index,
            classifier,
            answer_service,
        } = collaborators;

        Self {
            classifier,
            retriever: Retriever::new(embedder, index),
            composer: AnswerComposer::new(
                answer_service,
                ContextAssembler::new(config.context_budget),
                config.prompts.clone(),
            ),
            config,
        }
    }

    pub async fn ask(&self, request: AskRequest) -> Result<Answer, RagError> {
        self.ask_with_filter(request, None).await
    }

    /// Like [`ask`](Self::ask), with an extra equality predicate AND-ed into
    /// the scope filter.
    pub async fn ask_with_filter(
        &self,
        request: AskRequest,
        extra: Option<Predicate>,
    ) -> Result<Answer, RagError> {
        let raw_query = request.query;
        if raw_query.trim().is_empty() {
            return Err(RagError::InvalidRequest(
                "query must not be empty".to_string(),
            ));
        }
        let top_k = self.config.effective_top_k(request.top_k);

        let classified = self.classifier.classify(&raw_query).await;
        debug!(
            "Query '{}' -> '{}' (scope {}, degraded {})",
            raw_query, classified.query, classified.scope, classified.degraded
        );

        let retrieval = self
            .retriever
            .retrieve(
                &classified.query,
                classified.scope,
                top_k,
                self.config.relevance_threshold,
                extra,
            )
            .await?;

        let task_type = classify_intent(&raw_query);
        let hit_count = retrieval.len();
        let answer = self
            .composer
            .compose(&raw_query, retrieval, task_type)
            .await?;

        info!(
            "Answered query (scope {}, intent {}, {} hits, found {})",
            classified.scope, task_type, hit_count, answer.found
        );
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{KeywordClassifier, ModelClassifier};
    use crate::store::FilterField;
    use crate::testing::{
        FailingEmbedder, FailingIndex, FixedIndex, KeywordEmbedder, ScriptedCompletion, hit,
        lesson_record, seed_catalog,
    };
    use crate::types::TaskType;
    use std::sync::atomic::Ordering;

    fn engine_with(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        answer_service: Arc<ScriptedCompletion>,
    ) -> RagEngine {
        RagEngine::new(
            Collaborators {
                embedder,
                index,
                classifier: Arc::new(KeywordClassifier::new()),
                answer_service,
            },
            EngineConfig::default(),
        )
    }

    fn seeded(answer_service: Arc<ScriptedCompletion>) -> RagEngine {
        engine_with(
            Arc::new(KeywordEmbedder::new()),
            Arc::new(seed_catalog()),
            answer_service,
        )
    }

    #[tokio::test]
    async fn test_lesson_question_is_answered_from_lessons() {
        let service = Arc::new(ScriptedCompletion::replying(
            "Khóa học Python có 2 bài học: Giới thiệu Python, Biến và kiểu dữ liệu.",
        ));
        let answer = seeded(service.clone())
            .ask(AskRequest::new("Khóa học Python có bao nhiêu bài học?"))
            .await
            .unwrap();

        assert!(answer.found);
        assert_eq!(answer.task_type, Some(TaskType::Lessons));
        assert_eq!(answer.contexts.len(), 2);
        assert!(answer.contexts.iter().all(|c| c.starts_with("[LESSON] ")));
        assert!(answer.contexts[0].contains("→ Giới thiệu Python"));
        assert!(!answer.answer.is_empty());
        assert_eq!(service.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_off_catalog_question_takes_fallback_path() {
        let service = Arc::new(ScriptedCompletion::replying(
            "Xin lỗi, hiện chưa có khóa học nấu ăn Nhật Bản.",
        ));
        let answer = seeded(service.clone())
            .ask(AskRequest::new("Khóa học nấu ăn Nhật Bản"))
            .await
            .unwrap();

        assert!(!answer.found);
        assert!(answer.contexts.is_empty());
        assert_eq!(answer.task_type, None);
        assert_eq!(answer.answer, "Xin lỗi, hiện chưa có khóa học nấu ăn Nhật Bản.");
        assert_eq!(service.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_index_failure_is_an_error_not_a_miss() {
        let service = Arc::new(ScriptedCompletion::replying("unused"));
        let engine = engine_with(
            Arc::new(KeywordEmbedder::new()),
            Arc::new(FailingIndex { dims: 8 }),
            service.clone(),
        );

        let err = engine
            .ask(AskRequest::new("Khóa học Python có bao nhiêu bài học?"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Index(_)));
        assert!(service.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_hit_at_threshold_is_not_found() {
        let service = Arc::new(ScriptedCompletion::replying("Xin lỗi."));
        let index = Arc::new(FixedIndex::new(
            8,
            vec![hit(lesson_record("L004", "C002", "Giới thiệu Python", "x"), 0.25)],
        ));
        let answer = engine_with(Arc::new(KeywordEmbedder::new()), index, service)
            .ask(AskRequest::new("bài học Python"))
            .await
            .unwrap();
        assert!(!answer.found);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let service = Arc::new(ScriptedCompletion::replying("unused"));
        let engine = engine_with(Arc::new(FailingEmbedder), Arc::new(seed_catalog()), service);
        let err = engine.ask(AskRequest::new("python")).await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let service = Arc::new(ScriptedCompletion::failing("model overloaded"));
        let err = seeded(service.clone())
            .ask(AskRequest::new("Khóa học Python có bao nhiêu bài học?"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Completion(_)));
        assert_eq!(service.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_before_any_call() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let service = Arc::new(ScriptedCompletion::replying("unused"));
        let engine = engine_with(embedder.clone(), Arc::new(seed_catalog()), service.clone());

        let err = engine.ask(AskRequest::new("   \n")).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidRequest(_)));
        assert_eq!(embedder.calls(), 0);
        assert!(service.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_top_k_is_clamped() {
        let hits: Vec<_> = (0..30)
            .map(|i| hit(lesson_record(&format!("L{i}"), "C002", "Python", "x"), 0.9))
            .collect();
        let index = Arc::new(FixedIndex::new(8, hits));
        let service = Arc::new(ScriptedCompletion::replying("ok"));
        let engine = engine_with(Arc::new(KeywordEmbedder::new()), index.clone(), service);

        let answer = engine
            .ask(AskRequest::new("bài học").with_top_k(100))
            .await
            .unwrap();
        assert_eq!(answer.contexts.len(), 20);

        let answer = engine
            .ask(AskRequest::new("bài học").with_top_k(0))
            .await
            .unwrap();
        assert_eq!(answer.contexts.len(), 1);

        let answer = engine.ask(AskRequest::new("bài học")).await.unwrap();
        assert_eq!(answer.contexts.len(), 3);
        assert_eq!(index.searches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_model_classifier_uses_its_own_service() {
        let classifier_service = Arc::new(ScriptedCompletion::replying(
            "query: python bài học\nscope: lesson",
        ));
        let answer_service = Arc::new(ScriptedCompletion::replying("Có 2 bài học."));
        let engine = RagEngine::new(
            Collaborators {
                embedder: Arc::new(KeywordEmbedder::new()),
                index: Arc::new(seed_catalog()),
                classifier: Arc::new(ModelClassifier::new(classifier_service.clone())),
                answer_service: answer_service.clone(),
            },
            EngineConfig::default(),
        );

        let answer = engine
            .ask(AskRequest::new("python có mấy bài vậy"))
            .await
            .unwrap();
        assert!(answer.found);
        assert!(answer.contexts.iter().all(|c| c.starts_with("[LESSON] ")));
        assert_eq!(classifier_service.prompts().len(), 1);
        assert_eq!(answer_service.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_ask_with_filter_narrows_to_course() {
        let service = Arc::new(ScriptedCompletion::replying("ok"));
        let answer = seeded(service)
            .ask_with_filter(
                AskRequest::new("bài học python và seo").with_top_k(5),
                Some(Predicate::eq(FilterField::CourseId, "C002")),
            )
            .await
            .unwrap();
        assert!(answer.found);
        assert!(
            answer
                .contexts
                .iter()
                .all(|c| c.contains("Khóa học Lập trình Python cơ bản"))
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_engine() {
        let service = Arc::new(ScriptedCompletion::replying("ok"));
        let engine = Arc::new(seeded(service.clone()));

        let handles: Vec<_> = ["bài học python", "Khóa học SEO nâng cao", "nấu ăn"]
            .into_iter()
            .map(|q| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.ask(AskRequest::new(q)).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(service.prompts().len(), 3);
    }

    #[test]
    fn test_effective_top_k() {
        let config = EngineConfig::default();
        assert_eq!(config.effective_top_k(None), 3);
        assert_eq!(config.effective_top_k(Some(7)), 7);
        assert_eq!(config.effective_top_k(Some(0)), 1);
        assert_eq!(config.effective_top_k(Some(500)), 20);
    }
}
