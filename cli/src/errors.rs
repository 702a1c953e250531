//! # Error Handling
//!
//! User-friendly error display functions for the course-rag CLI.

use colored::Colorize;
use course_rag::{ErrorKind, RagError};

/// Display an embedding provider error with helpful suggestions
pub fn display_embedding_error(message: &str) {
    eprintln!("{} Embedding error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!("{}", "Possible causes:".yellow());
    eprintln!("  • Embedding server is unreachable");
    eprintln!("  • API key is missing or invalid");
    eprintln!("  • Model name does not exist on the provider");
    eprintln!();
    eprintln!(
        "{} Check the `embedding` section with `course-rag config show`.",
        "Tip:".cyan().bold()
    );
}

/// Display a vector index error with helpful suggestions
pub fn display_index_error(message: &str) {
    eprintln!("{} Index error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!("{}", "Possible causes:".yellow());
    eprintln!("  • Index file or table does not exist");
    eprintln!("  • Index was built with a different embedding model or dimension");
    eprintln!();
    eprintln!(
        "{} Check the `index` and `embedding` sections of your config.",
        "Tip:".cyan().bold()
    );
}

/// Display a completion service error with helpful suggestions
pub fn display_completion_error(message: &str) {
    eprintln!("{} LLM error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!("{}", "Possible causes:".yellow());
    eprintln!("  • LLM endpoint is unreachable");
    eprintln!("  • API key is invalid or rate limited");
    eprintln!();
    eprintln!(
        "{} Check the `llm` section with `course-rag config show`.",
        "Tip:".cyan().bold()
    );
}

/// Display a configuration error with helpful suggestions
pub fn display_config_error(message: &str) {
    eprintln!("{} Configuration error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!("{}", "Possible causes:".yellow());
    eprintln!("  • Configuration file is missing or corrupted");
    eprintln!("  • Missing required configuration");
    eprintln!();
    eprintln!(
        "{} Run `course-rag config init` to create a default config.",
        "Tip:".cyan().bold()
    );
}

/// Display a timeout error
pub fn display_timeout_error(secs: u64) {
    eprintln!(
        "{} Timed out: no answer within {} seconds",
        "✗".red().bold(),
        secs
    );
    eprintln!();
    eprintln!(
        "{} Raise `retrieval.timeout_secs` or check that your providers are responsive.",
        "Tip:".cyan().bold()
    );
}

/// Display a validation error with helpful suggestions
pub fn display_validation_error(message: &str) {
    eprintln!("{} Invalid request: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!(
        "{} Check the command options and try again.",
        "Tip:".cyan().bold()
    );
}

/// Display a pipeline error using the helper for its kind
pub fn display_rag_error(err: &RagError) {
    let message = err.to_string();
    match err.kind() {
        ErrorKind::Embedding => display_embedding_error(&message),
        ErrorKind::Index => display_index_error(&message),
        ErrorKind::Completion => display_completion_error(&message),
        ErrorKind::InvalidRequest => display_validation_error(&message),
    }
}

/// Display a generic error
pub fn display_error(message: &str) {
    eprintln!("{} Error: {}", "✗".red().bold(), message);
}
