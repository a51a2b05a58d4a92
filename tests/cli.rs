//! End-to-end tests for the runcap binary.

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use serde_json::{Value, json};
use serial_test::serial;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_runcap");

/// Long enough for runcap to install its signal handlers.
const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// Keeps consecutive signals from arriving in the same wakeup.
const SIGNAL_GAP: Duration = Duration::from_millis(50);

// =========================================================================
// Helper functions
// =========================================================================

fn runcap(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env_remove("RUNCAP_LOG")
        .output()
        .unwrap()
}

fn record(output: &Output) -> Value {
    assert_eq!(
        output.status.code(),
        Some(0),
        "runcap failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    assert!(stdout.ends_with('\n'), "record must be newline terminated");
    assert_eq!(stdout.lines().count(), 1, "exactly one record expected");
    serde_json::from_str(&stdout).unwrap()
}

/// Deliver `signals` to a runcap running `sleep 5`, in order.
fn interrupt_runcap(signals: &[Signal]) -> Output {
    let child = Command::new(BIN)
        .args(["--timeout", "10s", "sleep", "5"])
        .env_remove("RUNCAP_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    thread::sleep(STARTUP_GRACE);
    let pid = Pid::from_raw(child.id() as i32);
    for (index, signal) in signals.iter().enumerate() {
        if index > 0 {
            thread::sleep(SIGNAL_GAP);
        }
        // The child is not reaped until the wait below, so the pid stays valid.
        kill(pid, *signal).unwrap();
    }

    child.wait_with_output().unwrap()
}

// =========================================================================
// Usage errors
// =========================================================================

#[test]
fn test_no_arguments_prints_usage() {
    let output = runcap(&[]);
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Usage: runcap [--timeout <timeout>] <command> [arguments]..."));
    assert!(stderr.contains("Timeout (default 3s)"));
}

#[test]
fn test_unknown_flag_prints_message_and_usage() {
    let output = runcap(&["-t", "1s", "true"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut lines = stderr.lines();
    assert_eq!(lines.next(), Some("unknown argument: -t"));
    assert!(lines.next().unwrap().starts_with("Usage: "));
}

#[test]
fn test_bad_duration_prints_message_and_usage() {
    let output = runcap(&["--timeout", "true"]);
    assert_eq!(output.status.code(), Some(3));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("invalid duration \"true\"\n"));
}

#[test]
fn test_missing_command_after_timeout() {
    let output = runcap(&["--timeout", "1s"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Usage: "));
}

// =========================================================================
// Execution records
// =========================================================================

#[test]
fn test_successful_command() {
    let output = runcap(&["true"]);
    assert_eq!(record(&output), json!({"stdout": "", "stderr": "", "rs": 0}));
    assert!(output.stderr.is_empty());
}

#[test]
fn test_failing_command_still_exits_zero() {
    let output = runcap(&["false"]);
    assert_eq!(record(&output), json!({"stdout": "", "stderr": "", "rs": 1}));
}

#[test]
fn test_single_argument_is_split_on_spaces() {
    let output = runcap(&["echo hello world"]);
    assert_eq!(
        record(&output),
        json!({"stdout": "hello world\n", "stderr": "", "rs": 0})
    );
}

#[test]
fn test_multiple_arguments_are_passed_through() {
    let output = runcap(&["printf", "%s|%s", "a b", "c"]);
    assert_eq!(record(&output)["stdout"], "a b|c");
}

#[test]
fn test_non_utf8_argument_reaches_command_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join(OsStr::from_bytes(b"f\xffx"));
    std::fs::write(&file, "").unwrap();

    let output = Command::new(BIN)
        .arg("ls")
        .arg(&file)
        .env_remove("RUNCAP_LOG")
        .output()
        .unwrap();

    let value = record(&output);
    assert_eq!(value["rs"], 0);
    assert_eq!(value["stderr"], "");
}

#[test]
fn test_command_not_found() {
    let output = runcap(&["command-not-found-bin"]);
    assert_eq!(
        record(&output),
        json!({"stdout": "", "stderr": "command not found: command-not-found-bin", "rs": -2})
    );
}

#[test]
fn test_timeout_kills_command() {
    let output = runcap(&["--timeout", "200ms", "sleep", "5"]);
    assert_eq!(
        record(&output),
        json!({"stdout": "", "stderr": "context deadline exceeded; signal: killed", "rs": -3})
    );
}

#[test]
fn test_multiline_script_runs_in_shell() {
    let output = runcap(&["printf one\nprintf ' two'"]);
    assert_eq!(
        record(&output),
        json!({"stdout": "one two", "stderr": "", "rs": 0})
    );
}

#[test]
fn test_multiline_script_stops_on_error() {
    let output = runcap(&["printf before\nexit 4\nprintf after"]);
    let value = record(&output);
    assert_eq!(value["rs"], 4);
    assert_eq!(value["stdout"], "before");
}

#[test]
fn test_multiline_script_fails_on_broken_pipeline() {
    if !Path::new("/bin/bash").exists() {
        return;
    }
    let output = runcap(&["false | true\necho after"]);
    assert_eq!(record(&output), json!({"stdout": "", "stderr": "", "rs": 1}));
}

// =========================================================================
// Signals
// =========================================================================

#[test]
#[serial]
fn test_sigterm_cancels_command() {
    let output = interrupt_runcap(&[Signal::SIGTERM]);
    assert_eq!(
        record(&output),
        json!({
            "stdout": "",
            "stderr": "context canceled; signal: killed; got signal: terminated",
            "rs": -3
        })
    );
}

#[test]
#[serial]
fn test_sigint_cancels_command() {
    let output = interrupt_runcap(&[Signal::SIGINT]);
    assert_eq!(
        record(&output),
        json!({
            "stdout": "",
            "stderr": "context canceled; signal: killed; got signal: interrupt",
            "rs": -3
        })
    );
}

#[test]
#[serial]
fn test_later_signals_are_swallowed() {
    let output = interrupt_runcap(&[Signal::SIGTERM, Signal::SIGINT]);
    assert_eq!(
        record(&output),
        json!({
            "stdout": "",
            "stderr": "context canceled; signal: killed; got signal: terminated",
            "rs": -3
        })
    );
}
