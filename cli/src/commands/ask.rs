//! # Ask Command
//!
//! Answers a question about the course catalog. This is the composition
//! root: it builds the embedder, index, classifier, and LLM clients from the
//! configuration and hands them to a [`RagEngine`].
//!
//! ## Usage
//!
//! ```bash
//! # Ask a question
//! course-rag ask "Khóa học Python có bao nhiêu bài học?"
//!
//! # Fetch more neighbours and show the retrieved context
//! course-rag ask "Ai dạy khóa SEO?" --top-k 5 --show-context
//!
//! # Get JSON output
//! course-rag ask "Học phí khóa SEO?" --json
//! ```

use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use termimad::MadSkin;

use course_rag::{
    Answer, AskRequest, Collaborators, CompletionService, Embedder, KeywordClassifier, LlmClient,
    MemoryIndex, ModelClassifier, OllamaProvider, OpenAiProvider, QueryClassifier, RagEngine,
    RagError, VectorIndex,
};

use crate::config::{ClassifierKind, Config, EmbeddingConfig, IndexKind, LlmConfig, config_path};
use crate::errors::{display_config_error, display_rag_error, display_timeout_error};
use crate::exit_codes::*;

/// Arguments for the ask command
#[derive(Debug, Clone, Default)]
pub struct AskArgs {
    /// The question
    pub query: String,
    /// Neighbours to fetch (config default when absent)
    pub top_k: Option<usize>,
    /// Output as JSON
    pub json: bool,
    /// Print the retrieved context blocks
    pub show_context: bool,
    /// Enable verbose output
    pub verbose: bool,
    /// Config file override
    pub config_path: Option<PathBuf>,
}

/// Why the engine could not be built.
#[derive(Debug)]
enum SetupError {
    Config(String),
    Rag(RagError),
}

impl SetupError {
    fn report(&self) -> i32 {
        match self {
            SetupError::Config(message) => {
                display_config_error(message);
                EXIT_CONFIG_ERROR
            }
            SetupError::Rag(err) => {
                display_rag_error(err);
                for_error_kind(err.kind())
            }
        }
    }
}

/// Execute the ask command
///
/// # Returns
///
/// * `Ok(EXIT_SUCCESS)` - Question answered (including "nothing found")
/// * `Ok(EXIT_CONFIG_ERROR)` - Missing or invalid configuration
/// * `Ok(EXIT_EMBEDDING_ERROR)` - Embedding provider failed
/// * `Ok(EXIT_INDEX_ERROR)` - Index missing, unreachable, or inconsistent
/// * `Ok(EXIT_COMPLETION_ERROR)` - LLM call failed
/// * `Ok(EXIT_INVALID_INPUT)` - Empty question
/// * `Ok(EXIT_TIMEOUT)` - No answer within `retrieval.timeout_secs`
pub async fn execute(args: AskArgs) -> Result<i32> {
    let path = match config_path(args.config_path.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            display_config_error(&e.to_string());
            return Ok(EXIT_CONFIG_ERROR);
        }
    };
    let config = match Config::load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            display_config_error(&format!("{:#}", e));
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    if args.verbose {
        eprintln!("{} Config: {}", "→".cyan(), path.display());
        eprintln!(
            "{} Embedding: {} ({}), LLM: {} ({})",
            "→".cyan(),
            config.embedding.provider,
            config.embedding.model,
            config.llm.provider,
            config.llm.model
        );
    }

    let engine = match build_engine(&config, &path).await {
        Ok(engine) => engine,
        Err(e) => return Ok(e.report()),
    };

    let mut request = AskRequest::new(args.query.clone());
    request.top_k = args.top_k;

    let timeout_secs = config.retrieval.timeout_secs;
    let answer =
        match tokio::time::timeout(Duration::from_secs(timeout_secs), engine.ask(request)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                display_rag_error(&e);
                return Ok(for_error_kind(e.kind()));
            }
            Err(_) => {
                display_timeout_error(timeout_secs);
                return Ok(EXIT_TIMEOUT);
            }
        };

    if args.json {
        output_json(&answer)?;
    } else {
        output_formatted(&answer, &config.llm.model, args.show_context || args.verbose);
    }

    Ok(EXIT_SUCCESS)
}

async fn build_engine(config: &Config, config_file: &Path) -> Result<RagEngine, SetupError> {
    let embedder = build_embedder(&config.embedding)?;
    let index = build_index(config, config_file, embedder.dimensions()).await?;
    let answer_service: Arc<dyn CompletionService> = Arc::new(build_llm(&config.llm)?);

    let classifier: Arc<dyn QueryClassifier> = match config.classifier {
        ClassifierKind::Keyword => Arc::new(KeywordClassifier::new()),
        // A second client so the answer service still sees one call per question
        ClassifierKind::Model => Arc::new(ModelClassifier::new(Arc::new(build_llm(&config.llm)?))),
    };

    Ok(RagEngine::new(
        Collaborators {
            embedder,
            index,
            classifier,
            answer_service,
        },
        config.retrieval.engine_config(),
    ))
}

fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, SetupError> {
    match config.provider.as_str() {
        "openai" | "custom" => Ok(Arc::new(
            OpenAiProvider::new(
                config.get_api_key(),
                config.model.clone(),
                config.endpoint.clone(),
                config.dimensions,
            )
            .with_prefix_style(config.prefix_style),
        )),
        "ollama" => Ok(Arc::new(
            OllamaProvider::new(
                config.model.clone(),
                config.endpoint.clone(),
                config.dimensions,
            )
            .with_prefix_style(config.prefix_style),
        )),
        other => Err(SetupError::Config(format!(
            "Unsupported embedding provider '{}' (expected openai, custom or ollama)",
            other
        ))),
    }
}

async fn build_index(
    config: &Config,
    config_file: &Path,
    dims: usize,
) -> Result<Arc<dyn VectorIndex>, SetupError> {
    let path = config.index_path(config_file);
    match config.index.kind {
        IndexKind::Memory => {
            let index = MemoryIndex::load_snapshot(&path).map_err(SetupError::Rag)?;
            log::debug!("Loaded {} records from {}", index.len(), path.display());
            Ok(Arc::new(index))
        }
        #[cfg(feature = "lance")]
        IndexKind::Lance => {
            let index =
                course_rag::LanceIndex::open(&path.to_string_lossy(), &config.index.table, dims)
                    .await
                    .map_err(SetupError::Rag)?;
            Ok(Arc::new(index))
        }
        #[cfg(not(feature = "lance"))]
        IndexKind::Lance => {
            let _ = dims;
            Err(SetupError::Config(
                "index.kind is \"lance\" but this build lacks the `lance` feature".to_string(),
            ))
        }
    }
}

fn build_llm(config: &LlmConfig) -> Result<LlmClient, SetupError> {
    LlmClient::new(
        &config.provider,
        &config.endpoint,
        &config.model,
        config.get_api_key(),
    )
    .map_err(|e| SetupError::Config(format!("LLM: {}", e)))
}

/// Output the answer as JSON, in the shape of an `/ask` response
fn output_json(answer: &Answer) -> Result<()> {
    let mut output = serde_json::to_value(answer)?;
    if let Some(map) = output.as_object_mut() {
        map.insert("status".to_string(), serde_json::json!("ok"));
    }
    let json = serde_json::to_string_pretty(&output)?;
    println!("{}", json);
    Ok(())
}

/// Maximum width for markdown rendering
const MARKDOWN_MAX_WIDTH: usize = 80;

/// Create a styled skin for terminal markdown rendering
fn create_markdown_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.set_headers_fg(termimad::crossterm::style::Color::Cyan);
    skin.bold.set_fg(termimad::crossterm::style::Color::White);
    skin.italic
        .set_fg(termimad::crossterm::style::Color::Yellow);
    skin
}

/// Render markdown text with a maximum width
fn render_markdown(text: &str) {
    let skin = create_markdown_skin();
    let fmt_text = termimad::FmtText::from(&skin, text, Some(MARKDOWN_MAX_WIDTH));
    print!("{}", fmt_text);
}

fn output_formatted(answer: &Answer, model: &str, show_context: bool) {
    println!();
    println!(
        "{} {}",
        "Answer".bold().underline(),
        format!("({})", model).dimmed()
    );
    println!();
    render_markdown(answer.answer.trim());
    println!();

    match answer.task_type {
        Some(task_type) => println!(
            "{} {} relevant record(s), intent: {}",
            "ℹ".blue(),
            answer.contexts.len(),
            task_type
        ),
        None => println!(
            "{} No matching course or lesson found in the catalog.",
            "ℹ".blue()
        ),
    }

    if show_context && !answer.contexts.is_empty() {
        println!();
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", "Retrieved Context".bold().underline());
        for block in &answer.contexts {
            println!();
            for line in block.lines() {
                println!("  {}", line.dimmed());
            }
        }
    }
    println!();
}
