/// pgmin Error Module
///
/// This module defines the error types used across pgmin. Administrative
/// operations distinguish "expected" negative outcomes (a database that
/// already exists, a role that is missing), which are reported as ordinary
/// return values plus a log line, from hard failures, which surface here.
use thiserror::Error;

/// Error type for pgmin.
///
/// Covers the failure modes of driving the PostgreSQL client tools:
/// - Locating the client binaries on the executing host
/// - Spawning them and interpreting their exit status
/// - Parsing their tabular output
/// - Loading configuration files
#[derive(Error, Debug)]
pub enum PgminError {
    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client command spawn or non-zero exit failures
    #[error("Command error: {0}")]
    Command(String),

    /// Tabular output that does not match the expected column layout
    #[error("Parse error: {0}")]
    Parse(String),

    /// The administrative client binary is not present on this host
    #[error("Client unavailable: {0}")]
    Unavailable(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use PgminError as the error type.
pub type Result<T> = std::result::Result<T, PgminError>;

/// Result of operations that return the client's raw output when they run,
/// and `None` when a precondition turned them into a logged no-op.
pub type CommandResult = Result<Option<String>>;
