//! Diagnostic logging.
//!
//! Logs go to stderr so stdout carries nothing but the JSON record.

use crate::config::{DEFAULT_LOG_FILTER, LOG_ENV};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
