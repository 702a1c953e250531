//! # Completion Service
//!
//! Single-shot text completion used to compose answers. [`LlmClient`]
//! supports OpenAI, Anthropic, Ollama, and custom OpenAI-compatible
//! endpoints. No conversation state is kept between calls and nothing is
//! retried: a failed call surfaces as a [`CompletionError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use course_rag::completion::{CompletionService, LlmClient};
//!
//! async fn ask() -> Result<String, course_rag::CompletionError> {
//!     let client = LlmClient::new("openai", "https://api.openai.com/v1", "gpt-4o-mini", None)?;
//!     client.complete("Khóa học Python có bao nhiêu bài học?").await
//! }
//! ```

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;

/// Prompt in, text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

const SYSTEM_PROMPT: &str = "Bạn là trợ lý AI cho hệ thống khóa học trực tuyến. \
Chỉ trả lời dựa trên dữ liệu được cung cấp trong câu hỏi, bằng tiếng Việt, ngắn gọn và chính xác.";

// =============================================================================
// OpenAI Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessageResponse {
    /// Content can be null for some models (reasoning models during thinking)
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// =============================================================================
// Anthropic Types
// =============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: ApiErrorDetail,
}

// =============================================================================
// Ollama Types
// =============================================================================

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaMessageResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessageResponse,
}

// =============================================================================
// LLM Client
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    /// OpenAI or any OpenAI-compatible endpoint
    OpenAi,
    Anthropic,
    Ollama,
}

/// HTTP client for LLM chat APIs.
pub struct LlmClient {
    client: reqwest::Client,
    provider: Provider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl LlmClient {
    /// Create a new LLM client.
    ///
    /// # Arguments
    ///
    /// * `provider` - `openai`, `custom`, `anthropic` or `ollama`
    /// * `endpoint` - API base URL
    /// * `model` - Model name
    /// * `api_key` - Required for every provider except `ollama`
    pub fn new(
        provider: &str,
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
    ) -> Result<Self, CompletionError> {
        let provider = match provider {
            "openai" | "custom" => Provider::OpenAi,
            "anthropic" => Provider::Anthropic,
            "ollama" => Provider::Ollama,
            other => {
                return Err(CompletionError::UnsupportedProvider {
                    provider: other.to_string(),
                });
            }
        };

        if provider != Provider::Ollama && api_key.is_none() {
            let env_var = match provider {
                Provider::Anthropic => "ANTHROPIC_API_KEY",
                _ => "OPENAI_API_KEY",
            };
            return Err(CompletionError::MissingApiKey {
                env_var: env_var.to_string(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            provider,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// Check if a model uses the newer OpenAI token parameter
    /// (`max_completion_tokens` instead of `max_tokens`).
    fn uses_new_token_param(model: &str) -> bool {
        let model_lower = model.to_lowercase();
        model_lower.contains("gpt-4o")
            || model_lower.contains("gpt-5")
            || model_lower.starts_with("o1")
            || model_lower.starts_with("o3")
            || model_lower.contains("chatgpt-4o")
    }

    /// Token limits and temperature for an OpenAI model.
    ///
    /// Reasoning models spend tokens on thinking and reject a temperature.
    fn openai_limits(model: &str) -> (Option<u32>, Option<u32>, Option<f32>) {
        if Self::uses_new_token_param(model) {
            let model_lower = model.to_lowercase();
            if model_lower.starts_with("o1")
                || model_lower.starts_with("o3")
                || model_lower.contains("gpt-5")
            {
                (None, Some(16384), None)
            } else {
                (None, Some(2048), Some(0.2))
            }
        } else {
            (Some(2048), None, Some(0.2))
        }
    }

    fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    async fn read_error(response: reqwest::Response) -> CompletionError {
        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<OpenAIErrorResponse>(&error_text)
            .map(|e| e.error.message)
            .or_else(|_| {
                serde_json::from_str::<AnthropicErrorResponse>(&error_text).map(|e| e.error.message)
            })
            .unwrap_or(error_text);
        CompletionError::ApiError { status, message }
    }

    async fn call_openai(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let (max_tokens, max_completion_tokens, temperature) = Self::openai_limits(&self.model);

        let request = OpenAIRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            max_completion_tokens,
            temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key()))
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let response_text = response.text().await.map_err(|e| CompletionError::Network {
            message: format!("Failed to read response body: {e}"),
        })?;
        let preview_end = response_text
            .char_indices()
            .nth(1000)
            .map_or(response_text.len(), |(idx, _)| idx);
        debug!("Raw completion response: {}", &response_text[..preview_end]);

        let parsed: OpenAIResponse =
            serde_json::from_str(&response_text).map_err(|e| CompletionError::ParseError {
                message: format!("Failed to parse OpenAI response: {e}"),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| CompletionError::ParseError {
                message: format!("No response content from model '{}'", self.model),
            })
    }

    async fn call_anthropic(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/messages", self.endpoint);
        let request = AnthropicRequest {
            model: &self.model,
            system: SYSTEM_PROMPT,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: 2048,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key())
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let parsed: AnthropicResponse =
            response
                .json()
                .await
                .map_err(|e| CompletionError::ParseError {
                    message: e.to_string(),
                })?;

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();
        if text.trim().is_empty() {
            return Err(CompletionError::ParseError {
                message: "No response content".to_string(),
            });
        }
        Ok(text)
    }

    async fn call_ollama(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/api/chat", self.endpoint);
        let request = OllamaRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        let parsed: OllamaResponse =
            response
                .json()
                .await
                .map_err(|e| CompletionError::ParseError {
                    message: e.to_string(),
                })?;
        if parsed.message.content.trim().is_empty() {
            return Err(CompletionError::ParseError {
                message: "No response content".to_string(),
            });
        }
        Ok(parsed.message.content)
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        debug!(
            "Completion request to {:?}/{} ({} chars)",
            self.provider,
            self.model,
            prompt.chars().count()
        );
        match self.provider {
            Provider::OpenAi => self.call_openai(prompt).await,
            Provider::Anthropic => self.call_anthropic(prompt).await,
            Provider::Ollama => self.call_ollama(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_new_requires_api_key_for_hosted_providers() {
        let err = LlmClient::new("openai", "https://api.openai.com/v1", "gpt-4o", None)
            .err()
            .unwrap();
        assert!(matches!(err, CompletionError::MissingApiKey { ref env_var } if env_var == "OPENAI_API_KEY"));

        let err = LlmClient::new("anthropic", "https://api.anthropic.com/v1", "claude", None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));

        assert!(LlmClient::new("ollama", "http://localhost:11434", "llama3.2", None).is_ok());
    }

    #[test]
    fn test_new_rejects_unknown_provider() {
        let err = LlmClient::new("bard", "http://x", "m", Some("k".into()))
            .err()
            .unwrap();
        assert!(matches!(err, CompletionError::UnsupportedProvider { .. }));
    }

    #[test]
    fn test_openai_limits_by_model_family() {
        assert_eq!(LlmClient::openai_limits("gpt-4"), (Some(2048), None, Some(0.2)));
        assert_eq!(
            LlmClient::openai_limits("gpt-4o-mini"),
            (None, Some(2048), Some(0.2))
        );
        assert_eq!(LlmClient::openai_limits("o3-mini"), (None, Some(16384), None));
    }

    #[tokio::test]
    async fn test_openai_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "Khóa học có 2 bài học." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(
            "openai",
            &format!("{}/v1", server.uri()),
            "gpt-4o-mini",
            Some("sk-test".to_string()),
        )
        .unwrap();
        let text = client.complete("prompt").await.unwrap();
        assert_eq!(text, "Khóa học có 2 bài học.");
    }

    #[tokio::test]
    async fn test_openai_long_multibyte_reply() {
        let long_answer = "Khóa học Lập trình Python cơ bản. ".repeat(80);
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": long_answer } }]
            })))
            .mount(&server)
            .await;

        let client =
            LlmClient::new("custom", &server.uri(), "m", Some("k".to_string())).unwrap();
        assert_eq!(client.complete("prompt").await.unwrap(), long_answer);
    }

    #[tokio::test]
    async fn test_openai_rate_limit_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit reached" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            LlmClient::new("custom", &server.uri(), "m", Some("k".to_string())).unwrap();
        let err = client.complete("prompt").await.unwrap_err();
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("Rate limit reached"));
    }

    #[tokio::test]
    async fn test_openai_null_content_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": null } }]
            })))
            .mount(&server)
            .await;

        let client =
            LlmClient::new("openai", &server.uri(), "gpt-5", Some("k".to_string())).unwrap();
        let err = client.complete("prompt").await.unwrap_err();
        assert!(matches!(err, CompletionError::ParseError { .. }));
    }

    #[tokio::test]
    async fn test_anthropic_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "ak"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "Tác giả là Trần Huy." }]
            })))
            .mount(&server)
            .await;

        let client =
            LlmClient::new("anthropic", &server.uri(), "claude", Some("ak".to_string())).unwrap();
        assert_eq!(client.complete("p").await.unwrap(), "Tác giả là Trần Huy.");
    }

    #[tokio::test]
    async fn test_ollama_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({ "stream": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "role": "assistant", "content": "Xin lỗi." }
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new("ollama", &server.uri(), "llama3.2", None).unwrap();
        assert_eq!(client.complete("p").await.unwrap(), "Xin lỗi.");
    }

    #[tokio::test]
    async fn test_ollama_blank_reply_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "role": "assistant", "content": "   " }
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new("ollama", &server.uri(), "llama3.2", None).unwrap();
        let err = client.complete("p").await.unwrap_err();
        assert!(matches!(err, CompletionError::ParseError { .. }));
    }

    #[tokio::test]
    async fn test_network_failure_is_network_error() {
        let client = LlmClient::new("ollama", "http://127.0.0.1:1", "llama3.2", None).unwrap();
        let err = client.complete("p").await.unwrap_err();
        assert!(matches!(err, CompletionError::Network { .. }));
    }
}
