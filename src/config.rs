//! Process-wide configuration for runcap.
//!
//! Everything here is resolved once at startup and then passed around by
//! value. Nothing is read from ambient globals after that.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Preferred shell for multi-line scripts; supports `set -o pipefail`.
pub const ENHANCED_SHELL: &str = "/bin/bash";

/// POSIX shell used when the enhanced shell is not installed.
pub const POSIX_SHELL: &str = "/bin/sh";

/// Environment variable holding the log filter (`tracing_subscriber::EnvFilter` syntax).
pub const LOG_ENV: &str = "RUNCAP_LOG";

/// Log filter used when `RUNCAP_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Shell used to wrap multi-line scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    path: PathBuf,
}

impl Shell {
    /// Pick the first candidate that exists on disk.
    ///
    /// Falls back to the last candidate when none exist, so the command still
    /// fails later with a normal "command not found" record.
    pub fn locate(candidates: &[&Path]) -> Self {
        let chosen = candidates
            .iter()
            .find(|candidate| candidate.exists())
            .or_else(|| candidates.last())
            .map(|path| path.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(POSIX_SHELL));
        Self { path: chosen }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path as it is placed in a command vector.
    pub fn program(&self) -> OsString {
        self.path.clone().into_os_string()
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::locate(&[Path::new(ENHANCED_SHELL), Path::new(POSIX_SHELL)])
    }
}

/// Configuration resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub shell: Shell,
}

impl Config {
    /// Inspect the host once.
    pub fn detect() -> Self {
        Self {
            shell: Shell::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_prefers_first_existing_candidate() {
        let temp_dir = TempDir::new().unwrap();
        let bash = temp_dir.path().join("bash");
        let sh = temp_dir.path().join("sh");
        std::fs::write(&bash, "").unwrap();
        std::fs::write(&sh, "").unwrap();

        let shell = Shell::locate(&[bash.as_path(), sh.as_path()]);
        assert_eq!(shell.path(), bash.as_path());
    }

    #[test]
    fn test_locate_skips_missing_candidates() {
        let temp_dir = TempDir::new().unwrap();
        let bash = temp_dir.path().join("bash");
        let sh = temp_dir.path().join("sh");
        std::fs::write(&sh, "").unwrap();

        let shell = Shell::locate(&[bash.as_path(), sh.as_path()]);
        assert_eq!(shell.path(), sh.as_path());
    }

    #[test]
    fn test_locate_falls_back_to_last_candidate() {
        let temp_dir = TempDir::new().unwrap();
        let bash = temp_dir.path().join("bash");
        let sh = temp_dir.path().join("sh");

        let shell = Shell::locate(&[bash.as_path(), sh.as_path()]);
        assert_eq!(shell.path(), sh.as_path());
    }

    #[test]
    fn test_locate_without_candidates_uses_posix_shell() {
        assert_eq!(Shell::locate(&[]).path(), Path::new(POSIX_SHELL));
    }

    #[test]
    fn test_detect_resolves_a_known_shell() {
        let config = Config::detect();
        let path = config.shell.path();
        assert!(path == Path::new(ENHANCED_SHELL) || path == Path::new(POSIX_SHELL));
    }
}
