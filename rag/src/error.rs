use thiserror::Error;

/// Errors that can occur while answering a catalog question.
///
/// Each collaborator failure has its own variant so callers never confuse a
/// backend outage with a search that simply found nothing relevant.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Completion service error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse error category, used by callers to pick a response or exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Embedding,
    Index,
    Completion,
    InvalidRequest,
}

impl RagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::Embedding(_) => ErrorKind::Embedding,
            RagError::Index(_) => ErrorKind::Index,
            RagError::Completion(_) => ErrorKind::Completion,
            RagError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}

/// Errors from completion-service calls.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// API key is missing or cannot be found.
    #[error("API key not found. Set {env_var} environment variable")]
    MissingApiKey { env_var: String },

    /// Network error communicating with the LLM API.
    #[error("Network error: {message}")]
    Network { message: String },

    /// LLM API returned an error status (429 included).
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse the response, or it carried no content.
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Provider not supported.
    #[error("Unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },
}

impl CompletionError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CompletionError::ApiError { status: 429, .. })
    }
}
