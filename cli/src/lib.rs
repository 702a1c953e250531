//! # course-rag CLI Library
//!
//! Command implementations and configuration for the `course-rag` binary.
//!
//! ## Modules
//!
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration management
//! - [`errors`] - Error display helpers
//! - [`exit_codes`] - Standard exit codes

pub mod commands;
pub mod config;
pub mod errors;
pub mod exit_codes;

// Re-export commonly used types
pub use config::Config;
