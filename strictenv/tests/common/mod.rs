//! Common test utilities for integration tests.
//!
//! This module provides helpers for building environment maps and writing
//! temporary `.env` files.

use std::fs;
use std::path::PathBuf;

use strictenv::{BoxError, EnvMap, Value};
use tempfile::TempDir;

/// Builds an environment map from literal pairs.
#[allow(dead_code)]
pub fn env(pairs: &[(&str, &str)]) -> EnvMap {
    pairs.iter().copied().collect()
}

/// Writes `content` to a `.env` file inside a fresh temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped.
#[allow(dead_code)]
pub fn env_file(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(&path, content).unwrap();
    (dir, path)
}

/// Transform body: trims and lowercases a string value.
#[allow(dead_code)]
pub fn normalize(value: Value) -> Result<Value, BoxError> {
    let text = value.as_str().ok_or("expected a string")?;
    Ok(Value::from(text.trim().to_lowercase()))
}
