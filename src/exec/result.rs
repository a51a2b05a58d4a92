//! The execution record printed by runcap.

use serde::Serialize;

/// The command could not be started (missing executable, spawn error, expired deadline).
pub const START_FAILURE: i32 = -2;

/// The command ended without an exit code (killed by a signal, wait failure).
pub const UNRESOLVED_TERMINATION: i32 = -3;

/// Prefix of the start-failure message for an executable that does not exist.
pub const COMMAND_NOT_FOUND: &str = "command not found";

/// Separator between diagnostics in `stderr`.
const DIAGNOSTIC_SEPARATOR: &str = "; ";

/// Outcome of one invocation, serialized as `{"stdout", "stderr", "rs"}`.
///
/// `exit_code` is the command's own exit code when it has one, otherwise one
/// of [`START_FAILURE`] or [`UNRESOLVED_TERMINATION`]. `stdout` is only filled
/// for a command that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "rs")]
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn exited(exit_code: i32, stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            exit_code,
        }
    }

    pub fn start_failure(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_code: START_FAILURE,
        }
    }

    pub fn command_not_found(program: &str) -> Self {
        Self::start_failure(format!("{COMMAND_NOT_FOUND}: {program}"))
    }

    pub fn unresolved(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_code: UNRESOLVED_TERMINATION,
        }
    }

    /// Fold cancellation diagnostics into `stderr`.
    ///
    /// Order is fixed: context error, then the runner's own text, then the
    /// signal notice. Empty parts are skipped.
    pub fn with_diagnostics(
        mut self,
        context_error: Option<&str>,
        signal_notice: Option<&str>,
    ) -> Self {
        let parts: Vec<&str> = [context_error, Some(self.stderr.as_str()), signal_notice]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        self.stderr = parts.join(DIAGNOSTIC_SEPARATOR);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_rs_field() {
        let result = ExecutionResult::exited(0, "exec_test\n".to_string());
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"stdout":"exec_test\n","stderr":"","rs":0}"#);
    }

    #[test]
    fn test_command_not_found_message() {
        let result = ExecutionResult::command_not_found("command-not-found-bin");
        assert_eq!(result.exit_code, START_FAILURE);
        assert_eq!(result.stderr, "command not found: command-not-found-bin");
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn test_unresolved_has_no_stdout() {
        let result = ExecutionResult::unresolved("signal: killed");
        assert_eq!(result.exit_code, UNRESOLVED_TERMINATION);
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn test_diagnostics_are_joined_in_order() {
        let result = ExecutionResult::unresolved("signal: killed")
            .with_diagnostics(Some("context canceled"), Some("got signal: interrupt"));
        assert_eq!(
            result.stderr,
            "context canceled; signal: killed; got signal: interrupt"
        );
    }

    #[test]
    fn test_diagnostics_skip_missing_parts() {
        let result = ExecutionResult::exited(1, String::new()).with_diagnostics(None, None);
        assert_eq!(result.stderr, "");

        let result = ExecutionResult::exited(0, "out".to_string())
            .with_diagnostics(Some("context deadline exceeded"), None);
        assert_eq!(result.stderr, "context deadline exceeded");
        assert_eq!(result.stdout, "out");

        let result = ExecutionResult::start_failure("boom")
            .with_diagnostics(None, Some("got signal: terminated"));
        assert_eq!(result.stderr, "boom; got signal: terminated");
    }
}
