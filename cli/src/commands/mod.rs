//! # CLI Command Implementations
//!
//! Each submodule represents a top-level command or command group.
//!
//! ## Available Commands
//!
//! - [`ask`] - Answer a question about the course catalog
//! - [`config`] - Create and inspect the CLI configuration

pub mod ask;
pub mod config;
