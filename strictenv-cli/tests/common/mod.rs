//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary directories
//! - Command builders with an isolated process environment
//! - Fixture files (.env files and schema documents)

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A schema document exercising prefixes, nesting, enums and defaults.
#[allow(dead_code)]
pub const APP_SCHEMA: &str = r#"
config:
  env_prefix: APP_
  env_nested_delimiter: "__"
enums:
  - name: Level
    members: [debug, info]
schemas:
  - name: App
    fields:
      - {name: token, type: str, description: API token}
      - {name: level, type: Level, default: info}
      - {name: workers, type: int, default: 2, gt: 0}
      - {name: database, type: Database}
  - name: Database
    fields:
      - {name: host, type: str, description: Database host}
      - {name: port, type: int, default: 5432}
"#;

/// Test environment with an isolated temporary directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            temp_path,
        }
    }

    /// Get a bare command builder that inherits the process environment.
    pub fn command_bare(&self) -> Command {
        Command::cargo_bin("strictenv").expect("Failed to find strictenv binary")
    }

    /// Get a command builder with an empty process environment.
    ///
    /// Keeps tests independent of the developer's shell and of
    /// `STRICTENV_*` variables.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.env_clear();
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file under the test directory and return its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Write the standard application schema document.
    pub fn app_schema(&self) -> PathBuf {
        self.write_file("schema.yaml", APP_SCHEMA)
    }
}
