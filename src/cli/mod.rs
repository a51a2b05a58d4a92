//! Command-line resolution for runcap.
//!
//! The grammar is deliberately small:
//!
//! ```text
//! runcap [--timeout <duration>] <command> [arguments]...
//! ```
//!
//! Only the first argument may be a flag. A single command argument is
//! inspected further: a multi-line script is handed to the shell, a one-line
//! command is split on spaces, and anything else is run as-is.

use crate::config::Shell;
use crate::duration;
use crate::duration::DurationError;
use crate::error::{ResolveError, Result};
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::time::Duration;
use tracing::debug;

/// The only flag runcap understands.
pub const TIMEOUT_FLAG: &str = "--timeout";

/// Deadline used when `--timeout` is not given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Prepended to multi-line scripts so a failing pipeline stage fails the script.
pub const PIPEFAIL_PREAMBLE: &str = "set -o pipefail\n";

/// A fully resolved invocation: how long to wait and what to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub timeout: Duration,
    /// Program followed by its arguments, byte for byte as given. Never empty.
    pub command: Vec<OsString>,
}

/// Turn raw arguments (without the program name) into an execution request.
///
/// # Errors
///
/// * [`ResolveError::Usage`] - no arguments, no command, or `--timeout` without a value
/// * [`ResolveError::UnknownArgument`] - a first argument starting with `-` other than `--timeout`
/// * [`ResolveError::InvalidDuration`] - the `--timeout` value is not a duration
pub fn resolve(args: &[OsString], shell: &Shell) -> Result<ExecutionRequest> {
    let Some(first) = args.first() else {
        return Err(ResolveError::Usage);
    };

    let (timeout, candidate) = if first.as_bytes().starts_with(b"-") {
        if first != TIMEOUT_FLAG {
            return Err(ResolveError::UnknownArgument(
                first.to_string_lossy().into_owned(),
            ));
        }
        let value = args.get(1).ok_or(ResolveError::Usage)?;
        (parse_timeout(value)?, &args[2..])
    } else {
        (DEFAULT_TIMEOUT, args)
    };

    let command = match candidate {
        [] => return Err(ResolveError::Usage),
        [single] => expand_single(single, shell),
        many => many.to_vec(),
    };

    debug!(?timeout, ?command, "resolved invocation");
    Ok(ExecutionRequest { timeout, command })
}

fn parse_timeout(value: &OsStr) -> Result<Duration> {
    let text = value
        .to_str()
        .ok_or_else(|| DurationError::Invalid(value.to_string_lossy().into_owned()))?;
    Ok(duration::parse(text)?)
}

/// Expand a lone command argument into a command vector.
///
/// Works on raw bytes so arguments that are not UTF-8 reach the child intact.
fn expand_single(script: &OsStr, shell: &Shell) -> Vec<OsString> {
    let bytes = script.as_bytes();
    if bytes.contains(&b'\n') {
        return vec![
            shell.program(),
            OsString::from("-c"),
            OsString::from("-e"),
            OsString::from_vec([PIPEFAIL_PREAMBLE.as_bytes(), bytes].concat()),
        ];
    }

    // Naive on purpose: no quote handling, empty pieces are kept.
    bytes
        .split(|byte| *byte == b' ')
        .map(|piece| OsStr::from_bytes(piece).to_os_string())
        .collect()
}

/// Usage banner printed on malformed invocations.
pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [{TIMEOUT_FLAG} <timeout>] <command> [arguments]...\n\
         \n  {TIMEOUT_FLAG} duration\tTimeout (default {})\n",
        duration::format(DEFAULT_TIMEOUT)
    )
}
