//! Command execution under a deadline.
//!
//! This module provides one-shot subprocess execution with:
//!
//! - A deadline and SIGINT/SIGTERM feeding a single cancellation token
//! - Stdout capture for commands that run to completion
//! - Classification of every outcome into an [`ExecutionResult`]
//! - Cancellation diagnostics folded into the record's `stderr`

pub mod cancel;
pub mod result;
pub mod runner;

pub use result::ExecutionResult;

use crate::cli::ExecutionRequest;
use cancel::CancellationController;
use tracing::debug;

/// Execute one request and build its record.
///
/// Must be called from within a tokio runtime with time, process and signal
/// drivers enabled.
pub async fn execute(request: &ExecutionRequest) -> ExecutionResult {
    let controller = CancellationController::start(request.timeout);
    let result = runner::run(&request.command, controller.context()).await;

    // Both checks run unconditionally; the runner has returned, so any
    // cancellation that stopped the child is already recorded.
    let diagnostics = controller.diagnostics();
    controller.release();
    debug!(?diagnostics, exit_code = result.exit_code, "invocation finished");

    result.with_diagnostics(
        diagnostics.context_message().as_deref(),
        diagnostics.signal_notice().as_deref(),
    )
}
