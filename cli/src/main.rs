//! # course-rag CLI
//!
//! Ask questions about a course catalog and get answers grounded in the
//! matching courses and lessons.
//!
//! ## Usage
//!
//! ```bash
//! # Create a config
//! course-rag config init
//!
//! # Ask a question
//! course-rag ask "Khóa học Python có bao nhiêu bài học?"
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use course_rag_cli::commands;

/// Initialize logger based on verbose flag
fn init_logger(verbose: bool) {
    let mut log_builder = env_logger::Builder::from_default_env();
    if verbose {
        log_builder.filter_level(log::LevelFilter::Debug);
    } else {
        log_builder.filter_level(log::LevelFilter::Info);
    }
    log_builder.init();
}

/// Main CLI structure
#[derive(Parser)]
#[command(name = "course-rag")]
#[command(about = "Answer questions about a course catalog", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/course-rag/config.json)
    #[arg(long, global = true, value_name = "PATH", env = "COURSE_RAG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Ask a question about courses and lessons
    Ask {
        /// Natural language question
        #[arg(value_name = "QUERY")]
        query: String,
        /// Number of records to retrieve (clamped to retrieval.max_top_k)
        #[arg(long, short = 'k', value_name = "COUNT")]
        top_k: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Print the retrieved context blocks
        #[arg(long)]
        show_context: bool,
        /// Enable verbose output
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// LLM providers accepted by `config init`
#[derive(Clone, Debug, ValueEnum)]
enum LlmChoice {
    Openai,
    Anthropic,
    Ollama,
    Custom,
}

/// Config subcommands
#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// LLM provider used for answers
        #[arg(long, value_name = "PROVIDER", default_value = "openai")]
        llm: LlmChoice,
        /// Model name (provider default when omitted)
        #[arg(long, value_name = "MODEL")]
        model: Option<String>,
        /// API endpoint (required for custom)
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
        /// Environment variable holding the API key (custom only)
        #[arg(long, value_name = "VAR")]
        api_key_env: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show the effective configuration
    Show {
        /// Show full API keys instead of masked values
        #[arg(long)]
        show_secrets: bool,
    },
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = run_command(cli.command, cli.config).await;
    std::process::exit(exit_code);
}

async fn run_command(command: Commands, config: Option<PathBuf>) -> i32 {
    use course_rag_cli::errors::display_error;
    use course_rag_cli::exit_codes::*;

    match command {
        Commands::Ask {
            query,
            top_k,
            json,
            show_context,
            verbose,
        } => {
            init_logger(verbose);
            let args = commands::ask::AskArgs {
                query,
                top_k,
                json,
                show_context,
                verbose,
                config_path: config,
            };
            match commands::ask::execute(args).await {
                Ok(exit_code) => exit_code,
                Err(e) => {
                    display_error(&format!("{:#}", e));
                    EXIT_ERROR
                }
            }
        }
        Commands::Config { command } => {
            init_logger(false);
            run_config_command(command, config)
        }
    }
}

fn run_config_command(command: ConfigCommands, config: Option<PathBuf>) -> i32 {
    use commands::config::{ConfigInitArgs, ConfigShowArgs, LlmProvider};
    use course_rag_cli::exit_codes::*;

    let result = match command {
        ConfigCommands::Init {
            llm,
            model,
            endpoint,
            api_key_env,
            force,
        } => {
            let llm = match llm {
                LlmChoice::Openai => LlmProvider::OpenAI {
                    model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
                },
                LlmChoice::Anthropic => LlmProvider::Anthropic {
                    model: model.unwrap_or_else(|| "claude-3-5-haiku-latest".to_string()),
                },
                LlmChoice::Ollama => LlmProvider::Ollama {
                    endpoint: endpoint.unwrap_or_else(|| "http://localhost:11434".to_string()),
                    model: model.unwrap_or_else(|| "llama3.2".to_string()),
                },
                LlmChoice::Custom => {
                    let (Some(endpoint), Some(model)) = (endpoint, model) else {
                        eprintln!("Error: --llm custom requires --endpoint and --model");
                        return EXIT_INVALID_INPUT;
                    };
                    LlmProvider::Custom {
                        endpoint,
                        model,
                        api_key_env,
                    }
                }
            };
            commands::config::execute_init(ConfigInitArgs {
                llm,
                force,
                config_path: config,
            })
        }
        ConfigCommands::Show { show_secrets } => {
            commands::config::execute_show(ConfigShowArgs {
                show_secrets,
                config_path: config,
            })
        }
        ConfigCommands::Path => commands::config::execute_path(config),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            EXIT_CONFIG_ERROR
        }
    }
}
