//! Subprocess runner.
//!
//! Starts a command bound to an [`ExecContext`], captures its stdout and
//! classifies how it ended. Every outcome, including failure to start, is
//! turned into an [`ExecutionResult`]; nothing is returned as an error.

use super::cancel::ExecContext;
use super::result::ExecutionResult;
use crate::signals;
use std::ffi::{OsStr, OsString};
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

/// How the wait on a started child ended.
enum Outcome {
    /// The child exited and its stdout was drained.
    Completed {
        status: io::Result<ExitStatus>,
        stdout: io::Result<Vec<u8>>,
    },
    /// The context was cancelled first; the child was killed and reaped.
    Cancelled { status: io::Result<ExitStatus> },
}

/// Run `command` to completion or until `context` is cancelled.
///
/// # Arguments
///
/// * `command` - Program followed by its arguments
/// * `context` - Cancellation handle; cancelling it kills the child
///
/// # Returns
///
/// * exit code `>= 0` - the child exited; `stdout` holds everything it printed
/// * [`START_FAILURE`](super::result::START_FAILURE) - the child could not be started
/// * [`UNRESOLVED_TERMINATION`](super::result::UNRESOLVED_TERMINATION) - the child ended
///   without an exit code; `stdout` is discarded
pub async fn run(command: &[OsString], context: &ExecContext) -> ExecutionResult {
    let Some((program, args)) = command.split_first() else {
        return ExecutionResult::start_failure("empty command");
    };

    // An expired deadline means the child is never started.
    if let Some(err) = context.err() {
        return ExecutionResult::start_failure(err.to_string());
    }

    let mut child = match spawn(program, args) {
        Ok(child) => child,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(?program, "executable not found");
            return ExecutionResult::command_not_found(&program.to_string_lossy());
        }
        Err(err) => {
            debug!(?program, error = %err, "failed to start command");
            return ExecutionResult::start_failure(err.to_string());
        }
    };
    debug!(?program, pid = ?child.id(), "command started");

    let stdout = child.stdout.take();
    let completed = tokio::select! {
        outcome = wait_with_stdout(&mut child, stdout) => Some(outcome),
        _ = context.cancelled() => None,
    };

    let outcome = match completed {
        Some(outcome) => outcome,
        None => Outcome::Cancelled {
            status: terminate(&mut child).await,
        },
    };

    classify(outcome)
}

fn spawn(program: &OsStr, args: &[OsString]) -> io::Result<Child> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
}

/// Wait for exit while draining stdout, so a chatty child never blocks on a full pipe.
async fn wait_with_stdout(child: &mut Child, stdout: Option<ChildStdout>) -> Outcome {
    let mut buf = Vec::new();
    let drain = async {
        match stdout {
            Some(mut pipe) => pipe.read_to_end(&mut buf).await.map(|_| ()),
            None => Ok(()),
        }
    };

    let (status, drained) = tokio::join!(child.wait(), drain);
    Outcome::Completed {
        status,
        stdout: drained.map(|()| buf),
    }
}

/// Kill the child and reap it.
async fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    if let Err(err) = child.start_kill() {
        // Already exited; the wait below reports its status.
        debug!(error = %err, "failed to kill command");
    }
    child.wait().await
}

fn classify(outcome: Outcome) -> ExecutionResult {
    match outcome {
        Outcome::Completed {
            status: Ok(status),
            stdout: Ok(stdout),
        } => match status.code() {
            Some(code) => {
                debug!(code, "command exited");
                ExecutionResult::exited(code, String::from_utf8_lossy(&stdout).into_owned())
            }
            None => terminated_without_code(status),
        },
        Outcome::Completed {
            status: Ok(_),
            stdout: Err(err),
        } => ExecutionResult::unresolved(format!("reading stdout: {err}")),
        Outcome::Completed { status: Err(err), .. } | Outcome::Cancelled { status: Err(err) } => {
            ExecutionResult::unresolved(err.to_string())
        }
        Outcome::Cancelled { status: Ok(status) } => match status.code() {
            // Exited on its own just before the kill; the drain was abandoned.
            Some(code) => ExecutionResult::exited(code, String::new()),
            None => terminated_without_code(status),
        },
    }
}

fn terminated_without_code(status: ExitStatus) -> ExecutionResult {
    let message = signals::describe_termination(status);
    debug!(%message, "command terminated without exit code");
    ExecutionResult::unresolved(message)
}
