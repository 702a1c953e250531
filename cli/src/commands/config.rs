//! # Config Command
//!
//! Creates and inspects the CLI configuration file.
//!
//! ## Usage
//!
//! ```bash
//! # Write a default config using OpenAI for answers
//! course-rag config init
//!
//! # Use a local Ollama model instead
//! course-rag config init --llm ollama --model llama3.2 --endpoint http://localhost:11434
//!
//! # Show the effective configuration (secrets masked)
//! course-rag config show
//!
//! # Print where the config file lives
//! course-rag config path
//! ```

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{Config, LlmConfig, config_path, mask_secret};
use crate::exit_codes::*;

/// LLM provider choice for `config init`
#[derive(Debug, Clone, PartialEq)]
pub enum LlmProvider {
    /// OpenAI API
    OpenAI { model: String },
    /// Anthropic API (Claude models)
    Anthropic { model: String },
    /// Local Ollama instance
    Ollama { endpoint: String, model: String },
    /// Custom OpenAI-compatible endpoint
    Custom {
        endpoint: String,
        model: String,
        api_key_env: Option<String>,
    },
}

impl LlmProvider {
    fn into_config(self) -> LlmConfig {
        match self {
            LlmProvider::OpenAI { model } => LlmConfig::openai(&model),
            LlmProvider::Anthropic { model } => LlmConfig::anthropic(&model),
            LlmProvider::Ollama { endpoint, model } => LlmConfig::ollama(&endpoint, &model),
            LlmProvider::Custom {
                endpoint,
                model,
                api_key_env,
            } => LlmConfig {
                provider: "custom".to_string(),
                endpoint,
                model,
                api_key: None,
                api_key_env,
            },
        }
    }
}

/// Arguments for the config init command
#[derive(Debug)]
pub struct ConfigInitArgs {
    pub llm: LlmProvider,
    /// Overwrite an existing file
    pub force: bool,
    pub config_path: Option<PathBuf>,
}

/// Arguments for the config show command
#[derive(Debug)]
pub struct ConfigShowArgs {
    /// Show full API keys (default: masked)
    pub show_secrets: bool,
    pub config_path: Option<PathBuf>,
}

/// Execute the config init command
///
/// # Returns
///
/// * `Ok(EXIT_SUCCESS)` - Config written
/// * `Ok(EXIT_CONFIG_ERROR)` - File exists and `--force` was not given
pub fn execute_init(args: ConfigInitArgs) -> Result<i32> {
    let path = config_path(args.config_path.as_deref())?;
    if path.exists() && !args.force {
        eprintln!(
            "{} Config already exists at {}. Use --force to overwrite.",
            "Error:".red().bold(),
            path.display()
        );
        return Ok(EXIT_CONFIG_ERROR);
    }

    let config = Config {
        llm: args.llm.into_config(),
        ..Config::default()
    };
    config.save_to(&path)?;

    println!();
    println!("{} Configuration written to {}", "✓".green().bold(), path.display());
    println!();
    println!("  {} {}", "LLM:".dimmed(), config.llm.provider);
    println!("  {} {}", "Model:".dimmed(), config.llm.model);
    println!(
        "  {} {}",
        "Index:".dimmed(),
        config.index_path(&path).display()
    );
    if !config.llm.is_ready() {
        println!();
        eprintln!(
            "{} API key not found. Set the {} environment variable.",
            "⚠".yellow().bold(),
            config.llm.api_key_env.as_deref().unwrap_or("API_KEY")
        );
    }
    println!();

    Ok(EXIT_SUCCESS)
}

/// Execute the config show command
///
/// # Returns
///
/// * `Ok(EXIT_SUCCESS)` - Configuration displayed successfully
/// * `Ok(EXIT_CONFIG_ERROR)` - No configuration found
pub fn execute_show(args: ConfigShowArgs) -> Result<i32> {
    let path = config_path(args.config_path.as_deref())?;
    let config = match Config::load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "{} {:#}. Run `course-rag config init` first.",
                "Error:".red().bold(),
                e
            );
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    println!();
    println!("{}", "course-rag Configuration".bold().underline());
    println!("  {} {}", "File:".dimmed(), path.display());
    println!();

    println!("{}", "LLM".cyan().bold());
    println!("  {} {}", "Provider:".dimmed(), config.llm.provider);
    println!("  {} {}", "Endpoint:".dimmed(), config.llm.endpoint);
    println!("  {} {}", "Model:".dimmed(), config.llm.model);
    print_key(
        config.llm.api_key_env.as_deref(),
        config.llm.api_key.as_deref(),
        args.show_secrets,
    );
    let ready = if config.llm.is_ready() {
        "✓ ready".green()
    } else {
        "✗ not ready (API key missing)".red()
    };
    println!("  {} {}", "Status:".dimmed(), ready);
    println!();

    let embedding = &config.embedding;
    println!("{}", "Embedding".cyan().bold());
    println!("  {} {}", "Provider:".dimmed(), embedding.provider);
    if let Some(ref endpoint) = embedding.endpoint {
        println!("  {} {}", "Endpoint:".dimmed(), endpoint);
    }
    println!("  {} {}", "Model:".dimmed(), embedding.model);
    if let Some(dims) = embedding.dimensions {
        println!("  {} {}", "Dimensions:".dimmed(), dims);
    }
    println!("  {} {:?}", "Prefix style:".dimmed(), embedding.prefix_style);
    print_key(
        embedding.api_key_env.as_deref(),
        embedding.api_key.as_deref(),
        args.show_secrets,
    );
    println!();

    println!("{}", "Index".cyan().bold());
    println!("  {} {:?}", "Kind:".dimmed(), config.index.kind);
    println!("  {} {}", "Path:".dimmed(), config.index_path(&path).display());
    println!("  {} {}", "Table:".dimmed(), config.index.table);
    println!();

    let retrieval = &config.retrieval;
    println!("{}", "Retrieval".cyan().bold());
    println!("  {} {:?}", "Classifier:".dimmed(), config.classifier);
    println!(
        "  {} {} (max {})",
        "Top-k:".dimmed(),
        retrieval.default_top_k,
        retrieval.max_top_k
    );
    println!("  {} {}", "Threshold:".dimmed(), retrieval.relevance_threshold);
    println!("  {} {} chars", "Context budget:".dimmed(), retrieval.context_budget);
    println!("  {} {}s", "Timeout:".dimmed(), retrieval.timeout_secs);
    println!();

    Ok(EXIT_SUCCESS)
}

/// Execute the config path command
pub fn execute_path(explicit: Option<PathBuf>) -> Result<i32> {
    let path = config_path(explicit.as_deref())?;
    println!("{}", path.display());
    Ok(EXIT_SUCCESS)
}

fn print_key(env_var: Option<&str>, stored: Option<&str>, show_secrets: bool) {
    if let Some(env_var) = env_var {
        let status = if std::env::var(env_var).is_ok() {
            "✓ set".green().to_string()
        } else {
            "✗ not set".red().to_string()
        };
        println!("  {} {} ({})", "API Key Env:".dimmed(), env_var, status);
    }
    if let Some(key) = stored {
        let display = if show_secrets {
            key.to_string()
        } else {
            mask_secret(key)
        };
        println!("  {} {}", "API Key:".dimmed(), display);
    }
}
