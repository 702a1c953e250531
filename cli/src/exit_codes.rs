//! # Exit Codes
//!
//! Standard exit codes for the course-rag CLI.
//!
//! Each failure class of the answer pipeline gets its own code so scripts
//! can tell a backend outage apart from a bad question.

use course_rag::ErrorKind;

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// General error (unspecified)
pub const EXIT_ERROR: i32 = 1;

/// Configuration error (missing or invalid config)
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Embedding provider failed or was unreachable
pub const EXIT_EMBEDDING_ERROR: i32 = 3;

/// Vector index failed, was unreachable, or returned inconsistent data
pub const EXIT_INDEX_ERROR: i32 = 4;

/// Completion service failed (network, API status, empty reply)
pub const EXIT_COMPLETION_ERROR: i32 = 5;

/// Invalid input (empty question, bad arguments)
pub const EXIT_INVALID_INPUT: i32 = 6;

/// The question did not finish within the configured timeout
pub const EXIT_TIMEOUT: i32 = 7;

/// Exit code for a pipeline failure.
pub fn for_error_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Embedding => EXIT_EMBEDDING_ERROR,
        ErrorKind::Index => EXIT_INDEX_ERROR,
        ErrorKind::Completion => EXIT_COMPLETION_ERROR,
        ErrorKind::InvalidRequest => EXIT_INVALID_INPUT,
    }
}
