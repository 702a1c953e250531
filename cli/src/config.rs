//! # Configuration Management
//!
//! This module handles loading and saving CLI configuration: the embedding
//! model, the LLM used for answers, the catalog index, and retrieval tuning.
//!
//! ## Configuration File Location
//!
//! `$XDG_CONFIG_HOME/course-rag/config.json`, falling back to
//! `$HOME/.config/course-rag/config.json` (`%USERPROFILE%` on Windows).
//!
//! The `--config` flag or the `COURSE_RAG_CONFIG` environment variable
//! point at a different file.
//!
//! ## LLM Configuration
//!
//! Answers can be generated by:
//! - OpenAI (GPT-4o and friends)
//! - Anthropic (Claude)
//! - Ollama (local models)
//! - Custom OpenAI-compatible endpoints

use anyhow::{Context, Result};
use course_rag::{EngineConfig, PrefixStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "COURSE_RAG_CONFIG";

const APP_DIR: &str = "course-rag";

/// LLM configuration for answer generation
///
/// # Supported Providers
///
/// - `openai`: OpenAI API
/// - `anthropic`: Anthropic API (Claude)
/// - `ollama`: Local Ollama instance
/// - `custom`: Custom OpenAI-compatible endpoint
///
/// # Example
///
/// ```rust
/// use course_rag_cli::config::LlmConfig;
///
/// let config = LlmConfig {
///     provider: "openai".to_string(),
///     endpoint: "https://api.openai.com/v1".to_string(),
///     model: "gpt-4o-mini".to_string(),
///     api_key: None,
///     api_key_env: Some("OPENAI_API_KEY".to_string()),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (openai, anthropic, ollama, custom)
    pub provider: String,
    /// API endpoint URL
    pub endpoint: String,
    /// Model name (e.g., gpt-4o-mini, claude-3-5-haiku-latest)
    pub model: String,
    /// API key stored in plaintext
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable name for API key (preferred over api_key)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl LlmConfig {
    /// Create a new OpenAI configuration
    pub fn openai(model: &str) -> Self {
        Self {
            provider: "openai".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            model: model.to_string(),
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
        }
    }

    /// Create a new Anthropic configuration
    pub fn anthropic(model: &str) -> Self {
        Self {
            provider: "anthropic".to_string(),
            endpoint: "https://api.anthropic.com/v1".to_string(),
            model: model.to_string(),
            api_key: None,
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
        }
    }

    /// Create a new Ollama configuration
    pub fn ollama(endpoint: &str, model: &str) -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: None,
            api_key_env: None,
        }
    }

    /// Get the API key from environment or config
    pub fn get_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key_env.as_deref(), self.api_key.as_deref())
    }

    /// Check if the LLM is configured and ready to use
    pub fn is_ready(&self) -> bool {
        // Ollama doesn't require an API key
        if self.provider == "ollama" {
            return true;
        }
        self.get_api_key().is_some()
    }

    /// Get a masked version of the API key for display
    pub fn masked_api_key(&self) -> Option<String> {
        self.get_api_key().map(|key| mask_secret(&key))
    }
}

/// Embedding provider configuration.
///
/// The model, dimensions, and prefix style must match what the catalog
/// index was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding provider (openai, ollama)
    pub provider: String,
    /// API base URL; provider default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub model: String,
    /// Vector length; provider default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    pub prefix_style: PrefixStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            endpoint: None,
            model: "text-embedding-3-small".to_string(),
            dimensions: Some(1536),
            prefix_style: PrefixStyle::None,
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
        }
    }
}

impl EmbeddingConfig {
    pub fn get_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key_env.as_deref(), self.api_key.as_deref())
    }
}

/// How questions are rewritten and scoped before retrieval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// Deterministic keyword rules
    #[default]
    Keyword,
    /// Ask a separate client built from the `llm` settings
    Model,
}

/// Catalog index backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// JSON snapshot loaded into memory
    #[default]
    Memory,
    /// LanceDB table (requires the `lance` feature)
    Lance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub kind: IndexKind,
    /// Snapshot file for `memory`, database directory for `lance`
    pub path: String,
    /// LanceDB table name
    pub table: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            kind: IndexKind::Memory,
            path: "catalog.json".to_string(),
            table: "course_rag".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub relevance_threshold: f32,
    pub context_budget: usize,
    /// Wall-clock limit for one `ask`
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            default_top_k: engine.default_top_k,
            max_top_k: engine.max_top_k,
            relevance_threshold: engine.relevance_threshold,
            context_budget: engine.context_budget,
            timeout_secs: 60,
        }
    }
}

impl RetrievalConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_top_k: self.default_top_k,
            max_top_k: self.max_top_k,
            relevance_threshold: self.relevance_threshold,
            context_budget: self.context_budget,
            ..EngineConfig::default()
        }
    }
}

/// CLI configuration
///
/// # Example
///
/// ```rust,no_run
/// use course_rag_cli::config::{Config, config_path};
///
/// let path = config_path(None).expect("no config directory");
/// Config::default().save_to(&path).expect("Failed to save config");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub classifier: ClassifierKind,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::openai("gpt-4o-mini"),
            embedding: EmbeddingConfig::default(),
            classifier: ClassifierKind::default(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(_)` - Configuration file not found or invalid
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to `path`
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Resolve `index.path` against the config file's directory when relative.
    pub fn index_path(&self, config_file: &Path) -> PathBuf {
        let path = PathBuf::from(&self.index.path);
        if path.is_absolute() {
            return path;
        }
        config_file
            .parent()
            .map(|dir| dir.join(&path))
            .unwrap_or(path)
    }
}

/// Get the path to the configuration file
///
/// An explicit path wins, then `COURSE_RAG_CONFIG`, then
/// `<config dir>/course-rag/config.json`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let config_dir = dirs_config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(APP_DIR).join("config.json"))
}

/// Get the config directory
///
/// Uses `$XDG_CONFIG_HOME`, else `$HOME/.config` on all platforms.
fn dirs_config_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .or_else(|| std::env::var("USERPROFILE").ok())
                .map(|h| PathBuf::from(h).join(".config"))
        })
}

fn resolve_api_key(env_var: Option<&str>, stored: Option<&str>) -> Option<String> {
    // First try environment variable
    if let Some(env_var) = env_var {
        if let Ok(key) = std::env::var(env_var) {
            if !key.is_empty() {
                return Some(key);
            }
        }
    }
    stored.map(str::to_string)
}

/// Mask a secret for display, keeping four characters at each end.
pub fn mask_secret(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}
