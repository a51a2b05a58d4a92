//! runcap: run a command under a deadline and report the outcome as JSON.
//!
//! This is the main entry point for the `runcap` CLI. It resolves arguments,
//! runs the command on a single-threaded tokio runtime, and prints exactly one
//! record to stdout. Only a malformed invocation stops runcap before that.

mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod exec;
pub mod exit_codes;
mod logging;
pub mod signals;

use anyhow::{Context, Result};
use cli::ExecutionRequest;
use config::Config;
use exec::ExecutionResult;
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

/// Fallback for the usage banner when argv[0] is unavailable.
const PROGRAM_NAME: &str = "runcap";

fn main() -> ExitCode {
    logging::init();

    let mut argv = std::env::args_os();
    let program = program_name(argv.next().as_deref().map(Path::new));
    let args: Vec<OsString> = argv.collect();

    let config = Config::detect();
    let request = match cli::resolve(&args, &config.shell) {
        Ok(request) => request,
        Err(err) => {
            if let Some(message) = err.message() {
                eprintln!("{}", message);
            }
            eprint!("{}", cli::usage(&program));
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    match run(&request) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_codes::INTERNAL_FAILURE as u8)
        }
    }
}

fn run(request: &ExecutionRequest) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let result = runtime.block_on(exec::execute(request));
    write_record(&result)
}

fn write_record(result: &ExecutionResult) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, result).context("failed to encode execution record")?;
    writeln!(stdout).context("failed to write execution record")?;
    stdout.flush().context("failed to flush execution record")?;
    Ok(())
}

fn program_name(argv0: Option<&Path>) -> String {
    argv0
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| PROGRAM_NAME.to_string())
}
