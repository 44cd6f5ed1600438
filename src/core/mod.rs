/// Core Module for pgmin
///
/// Shared infrastructure used by every layer of the crate: the error type
/// and result aliases.

pub mod error;

// Re-export commonly used types for convenience
pub use error::{CommandResult, PgminError, Result};
