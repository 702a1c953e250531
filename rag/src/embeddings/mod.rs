//! Embedding providers for turning catalog text and questions into vectors.
//!
//! Supports OpenAI-compatible APIs and Ollama. The text role (query or
//! passage) is passed explicitly on every call so the model's prefix
//! convention is applied the same way at query time as at indexing time.

mod passage;
mod provider;
mod role;

pub use passage::{course_passage, lesson_passage};
pub use provider::{Embedder, OllamaProvider, OpenAiProvider};
pub use role::{PrefixStyle, TextRole};
