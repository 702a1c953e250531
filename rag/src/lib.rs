//! course-rag: retrieval-augmented answers over a course catalog
//!
//! This crate answers free-form questions about courses and lessons:
//! - Query classification into a course or lesson retrieval scope
//! - Embedding generation via OpenAI-compatible APIs or Ollama
//! - Scoped vector search (in-memory or LanceDB) with a relevance threshold
//! - Intent routing (price, author, lessons) to tailor the answer prompt
//! - A single completion call per question via an LLM client
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use course_rag::{AskRequest, Collaborators, EngineConfig, KeywordClassifier, RagEngine};
//!
//! let engine = RagEngine::new(
//!     Collaborators {
//!         embedder: Arc::new(embedder),
//!         index: Arc::new(index),
//!         classifier: Arc::new(KeywordClassifier::new()),
//!         answer_service: Arc::new(llm),
//!     },
//!     EngineConfig::default(),
//! );
//! let answer = engine.ask(AskRequest::new("Khóa học Python có bao nhiêu bài học?")).await?;
//! ```

pub mod completion;
pub mod context;
pub mod embeddings;
pub mod error;
pub mod prompt;
pub mod query;
pub mod retrieval;
pub mod routing;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use completion::{CompletionService, LlmClient};
pub use context::{AssembledContext, ContextAssembler};
pub use embeddings::{Embedder, OllamaProvider, OpenAiProvider, PrefixStyle, TextRole};
pub use error::{CompletionError, ErrorKind, RagError};
pub use prompt::{AnswerComposer, PromptTemplates};
pub use query::{Collaborators, EngineConfig, RagEngine};
pub use retrieval::Retriever;
pub use routing::{ClassifiedQuery, KeywordClassifier, ModelClassifier, QueryClassifier, classify_intent};
pub use store::{FilterField, MemoryIndex, Predicate, SearchFilter, VectorIndex};
pub use types::{Answer, AskRequest, CourseRecord, Hit, RetrievalResult, Scope, TaskType};

#[cfg(feature = "lance")]
pub use store::LanceIndex;
