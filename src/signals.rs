//! Human-readable signal names.
//!
//! Used both for the `got signal: <name>` notice and for describing a child
//! that was terminated by a signal.

use nix::sys::signal::Signal;
use std::process::ExitStatus;

/// Short lowercase description of a signal, e.g. `interrupt` for SIGINT.
pub fn describe(signal: Signal) -> &'static str {
    match signal {
        Signal::SIGHUP => "hangup",
        Signal::SIGINT => "interrupt",
        Signal::SIGQUIT => "quit",
        Signal::SIGABRT => "aborted",
        Signal::SIGKILL => "killed",
        Signal::SIGSEGV => "segmentation fault",
        Signal::SIGPIPE => "broken pipe",
        Signal::SIGALRM => "alarm clock",
        Signal::SIGTERM => "terminated",
        other => other.as_str(),
    }
}

/// Error text for a process that ended without an exit code.
pub fn describe_termination(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(raw) => match Signal::try_from(raw) {
            Ok(signal) => format!("signal: {}", describe(signal)),
            Err(_) => format!("signal: {raw}"),
        },
        None => status.to_string(),
    }
}
