//! Error types for the runcap CLI.
//!
//! Only argument resolution can fail in a way that stops runcap. Everything that
//! goes wrong with the command itself is reported inside the execution record.

use crate::duration::DurationError;
use crate::exit_codes;
use thiserror::Error;

/// Failure to turn the command line into an execution request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Missing command or missing timeout value. The usage banner says it all.
    #[error("parse error")]
    Usage,

    /// A flag-shaped first argument other than `--timeout`.
    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    /// The value after `--timeout` is not a duration.
    #[error(transparent)]
    InvalidDuration(#[from] DurationError),
}

impl ResolveError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        exit_codes::USAGE_ERROR
    }

    /// Message to print ahead of the usage banner, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            ResolveError::Usage => None,
            other => Some(other.to_string()),
        }
    }
}

/// Result type alias for argument resolution.
pub type Result<T> = std::result::Result<T, ResolveError>;
