//! Test utilities for suitekit
//!
//! Helpers shared by unit and integration tests: logging setup and small
//! builders for suite configuration directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use chrono::NaiveDate;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::Environment;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without logging.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Fixed environment snapshot: `USER=dummy`, `HOME=/home/dummy`, today 2024-03-01.
pub fn test_environment() -> Environment {
    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
    Environment::from_vars([("USER", "dummy"), ("HOME", "/home/dummy")], today)
}

/// A suite configuration directory in a temporary location.
///
/// ```rust,no_run
/// use suitekit::test_utils::SuiteDir;
///
/// let suite = SuiteDir::new()
///     .file("user.yaml", "user: dummy\n")
///     .profile("user", &["user.yaml"]);
/// assert!(suite.path("profiles.yaml").exists());
/// ```
pub struct SuiteDir {
    dir: TempDir,
    profiles: Vec<(String, Vec<String>)>,
}

impl SuiteDir {
    /// Empty temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary suite directory"),
            profiles: Vec::new(),
        }
    }

    /// Write `content` to `name` inside the directory.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn file(self, name: &str, content: &str) -> Self {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directory");
        }
        fs::write(&path, content).expect("failed to write suite file");
        self
    }

    /// Add a profile listing `files` and rewrite `profiles.yaml`.
    pub fn profile(mut self, name: &str, files: &[&str]) -> Self {
        self.profiles.push((name.to_string(), files.iter().map(|f| (*f).to_string()).collect()));
        let content: String = self
            .profiles
            .iter()
            .map(|(name, files)| {
                let entries: String = files.iter().map(|file| format!("  - {file}\n")).collect();
                format!("{name}:\n{entries}")
            })
            .collect();
        self.file("profiles.yaml", &content)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.path("profiles.yaml")
    }
}

impl Default for SuiteDir {
    fn default() -> Self {
        Self::new()
    }
}
