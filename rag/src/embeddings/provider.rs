//! Embedder trait and HTTP implementations.
//!
//! OpenAI and Ollama expose near-identical embedding endpoints, so the main
//! differences are authentication and response shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::role::{PrefixStyle, TextRole};
use crate::error::RagError;

/// Converts text to vectors.
///
/// Implementations must be deterministic for a given model version and safe
/// to share across concurrent requests.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str, role: TextRole) -> Result<Vec<f32>, RagError>;

    /// Generate embeddings for a batch of texts sharing one role.
    async fn embed_batch(&self, texts: &[String], role: TextRole)
    -> Result<Vec<Vec<f32>>, RagError>;

    /// Return the dimensionality of embeddings produced.
    fn dimensions(&self) -> usize;

    /// Return the model name.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI embedding provider.
///
/// Works with OpenAI's API and any compatible endpoint (text-embeddings
/// servers hosting E5 models included).
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dims: usize,
    prefix: PrefixStyle,
}

impl OpenAiProvider {
    /// Create a new OpenAI-compatible provider.
    ///
    /// # Arguments
    /// * `api_key` - Bearer token; self-hosted endpoints may not need one
    /// * `model` - Model name (e.g., "text-embedding-3-small")
    /// * `endpoint` - API endpoint (defaults to "https://api.openai.com/v1")
    /// * `dims` - Embedding dimensions (1536 for text-embedding-3-small)
    pub fn new(
        api_key: Option<String>,
        model: String,
        endpoint: Option<String>,
        dims: Option<usize>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            api_key,
            model,
            dims: dims.unwrap_or(1536),
            prefix: PrefixStyle::None,
        }
    }

    /// Set the role-prefix convention the model was trained with.
    pub fn with_prefix_style(mut self, prefix: PrefixStyle) -> Self {
        self.prefix = prefix;
        self
    }
}

#[async_trait]
impl Embedder for OpenAiProvider {
    async fn embed(&self, text: &str, role: TextRole) -> Result<Vec<f32>, RagError> {
        let results = self.embed_batch(&[text.to_string()], role).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("Empty response from OpenAI".to_string()))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        role: TextRole,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/embeddings", self.endpoint);
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts.iter().map(|t| self.prefix.apply(role, t)).collect(),
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "OpenAI API error {status}: {body}"
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Malformed OpenAI response: {e}")))?;

        if result.data.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "Mismatch: {} inputs but {} embeddings",
                texts.len(),
                result.data.len()
            )));
        }
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Ollama embedding provider.
pub struct OllamaProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dims: usize,
    prefix: PrefixStyle,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// # Arguments
    /// * `model` - Model name (e.g., "nomic-embed-text")
    /// * `endpoint` - Ollama endpoint (defaults to "http://localhost:11434")
    /// * `dims` - Embedding dimensions (768 for nomic-embed-text)
    pub fn new(model: String, endpoint: Option<String>, dims: Option<usize>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            model,
            dims: dims.unwrap_or(768),
            prefix: PrefixStyle::None,
        }
    }

    pub fn with_prefix_style(mut self, prefix: PrefixStyle) -> Self {
        self.prefix = prefix;
        self
    }
}

#[async_trait]
impl Embedder for OllamaProvider {
    async fn embed(&self, text: &str, role: TextRole) -> Result<Vec<f32>, RagError> {
        let results = self.embed_batch(&[text.to_string()], role).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("Empty response from Ollama".to_string()))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        role: TextRole,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/api/embed", self.endpoint);
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            input: texts.iter().map(|t| self.prefix.apply(role, t)).collect(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("Ollama request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Ollama API error {status}: {body}"
            )));
        }

        let result: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Malformed Ollama response: {e}")))?;

        if result.embeddings.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "Mismatch: {} inputs but {} embeddings",
                texts.len(),
                result.embeddings.len()
            )));
        }
        Ok(result.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
