//! Environment maps and the environment merger.
//!
//! An [`EnvMap`] is the flat, insertion-ordered `key -> value` mapping every
//! source is reduced to. [`EnvironmentMerger`] layers an env file under the
//! runtime environment and applies the case policy.

use std::collections::HashMap;
use std::env;
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::dotenv;
use crate::error::{Error, Result};

/// Insertion-ordered string map.
///
/// Re-inserting an existing key overwrites its value in place, so the key
/// keeps the position of its first insertion.
///
/// # Examples
///
/// ```
/// use strictenv::EnvMap;
///
/// let mut map = EnvMap::new();
/// map.insert("B", "1");
/// map.insert("A", "2");
/// map.insert("B", "3");
///
/// let keys: Vec<&str> = map.keys().collect();
/// assert_eq!(keys, ["B", "A"]);
/// assert_eq!(map.get("B"), Some("3"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl EnvMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of the live process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    #[must_use]
    pub fn from_process_env() -> Self {
        env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// Returns the value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].1.as_str())
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts or overwrites `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(&position) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[position].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for EnvMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for EnvMap {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for EnvMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Composes the environment key for a field from a prefix and a name.
///
/// # Examples
///
/// ```
/// use strictenv::format_env_key;
///
/// assert_eq!(format_env_key("app_", "debug", false), "APP_DEBUG");
/// assert_eq!(format_env_key("app_", "debug", true), "app_debug");
/// ```
#[must_use]
pub fn format_env_key(prefix: &str, name: &str, case_sensitive: bool) -> String {
    let key = format!("{prefix}{name}");
    if case_sensitive {
        key
    } else {
        key.to_uppercase()
    }
}

/// Builds the effective environment map for a load.
pub struct EnvironmentMerger;

impl EnvironmentMerger {
    /// Merges an optional env file under the runtime environment.
    ///
    /// `env` of `None` snapshots the live process environment; an explicit
    /// map (even an empty one) is used as-is. Runtime values override file
    /// values key for key. Unless `case_sensitive`, keys are uppercased; in
    /// strict mode two differently-cased originals that normalize to the same
    /// key are rejected.
    ///
    /// # Errors
    ///
    /// Returns env file errors from [`dotenv::parse_env_file`] in strict mode,
    /// and [`Error::EnvKeyConflict`] on a case collision in strict mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use strictenv::{EnvMap, EnvironmentMerger};
    ///
    /// let env: EnvMap = [("debug", "1")].into_iter().collect();
    /// let merged = EnvironmentMerger::build(Some(&env), None, false, true).unwrap();
    /// assert_eq!(merged.get("DEBUG"), Some("1"));
    /// ```
    pub fn build(
        env: Option<&EnvMap>,
        env_file: Option<&Path>,
        case_sensitive: bool,
        strict: bool,
    ) -> Result<EnvMap> {
        let mut merged = EnvMap::new();
        if let Some(path) = env_file {
            let file_values = dotenv::parse_env_file(path, strict)?;
            log::debug!(
                "loaded {} keys from env file {}",
                file_values.len(),
                path.display()
            );
            merged.extend(file_values);
        }
        match env {
            Some(runtime) => merged.extend(runtime.iter()),
            None => merged.extend(EnvMap::from_process_env()),
        }

        if case_sensitive {
            return Ok(merged);
        }
        if !strict {
            return Ok(merged
                .into_iter()
                .map(|(key, value)| (key.to_uppercase(), value))
                .collect());
        }
        Self::normalize_strict(merged)
    }

    fn normalize_strict(merged: EnvMap) -> Result<EnvMap> {
        let mut normalized = EnvMap::new();
        let mut seen_original: HashMap<String, String> = HashMap::new();
        for (key, value) in merged {
            let normalized_key = key.to_uppercase();
            if let Some(previous) = seen_original.get(&normalized_key) {
                if *previous != key {
                    return Err(Error::EnvKeyConflict {
                        normalized_key,
                        first_key: previous.clone(),
                        second_key: key,
                    });
                }
            }
            seen_original.insert(normalized_key.clone(), key);
            normalized.insert(normalized_key, value);
        }
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn map(pairs: &[(&str, &str)]) -> EnvMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_env_map_overwrite_keeps_position() {
        let mut env = map(&[("A", "1"), ("B", "2")]);
        assert_eq!(env.insert("A", "3"), Some("1".to_string()));
        assert_eq!(env.iter().collect::<Vec<_>>(), [("A", "3"), ("B", "2")]);
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_env_map_serializes_in_order() {
        let env = map(&[("Z", "1"), ("A", "2")]);
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(json, r#"{"Z":"1","A":"2"}"#);
    }

    #[test]
    fn test_format_env_key() {
        assert_eq!(format_env_key("", "port", false), "PORT");
        assert_eq!(format_env_key("svc_", "Port", true), "svc_Port");
    }

    #[test]
    fn test_runtime_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "PORT=1\nHOST=file\n").unwrap();

        let env = map(&[("PORT", "2")]);
        let merged = EnvironmentMerger::build(Some(&env), Some(&path), false, true).unwrap();
        assert_eq!(merged.get("PORT"), Some("2"));
        assert_eq!(merged.get("HOST"), Some("file"));
    }

    #[test]
    fn test_case_sensitive_keeps_keys() {
        let env = map(&[("debug", "1"), ("DEBUG", "0")]);
        let merged = EnvironmentMerger::build(Some(&env), None, true, true).unwrap();
        assert_eq!(merged.get("debug"), Some("1"));
        assert_eq!(merged.get("DEBUG"), Some("0"));
    }

    #[test]
    fn test_strict_conflict_detected() {
        let env = map(&[("token", "a"), ("Token", "b")]);
        let err = EnvironmentMerger::build(Some(&env), None, false, true).unwrap_err();
        match err {
            Error::EnvKeyConflict {
                normalized_key,
                first_key,
                second_key,
            } => {
                assert_eq!(normalized_key, "TOKEN");
                assert_eq!(first_key, "token");
                assert_eq!(second_key, "Token");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_strict_conflict_last_wins() {
        let env = map(&[("token", "a"), ("Token", "b")]);
        let merged = EnvironmentMerger::build(Some(&env), None, false, false).unwrap();
        assert_eq!(merged.get("TOKEN"), Some("b"));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_same_key_from_file_and_runtime_is_not_conflict() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "token=file\n").unwrap();

        let env = map(&[("token", "runtime")]);
        let merged = EnvironmentMerger::build(Some(&env), Some(&path), false, true).unwrap();
        assert_eq!(merged.get("TOKEN"), Some("runtime"));
    }

    #[test]
    fn test_missing_file_strict_and_lenient() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.env");
        let env = EnvMap::new();

        let err = EnvironmentMerger::build(Some(&env), Some(&path), false, true).unwrap_err();
        assert!(matches!(err, Error::EnvFileNotFound { .. }));

        let merged = EnvironmentMerger::build(Some(&env), Some(&path), false, false).unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    #[serial]
    fn test_process_env_snapshot_used_when_no_env() {
        env::set_var("STRICTENV_MERGER_PROBE", "present");
        let merged = EnvironmentMerger::build(None, None, false, false).unwrap();
        env::remove_var("STRICTENV_MERGER_PROBE");
        assert_eq!(merged.get("STRICTENV_MERGER_PROBE"), Some("present"));
    }

    #[test]
    #[serial]
    fn test_explicit_empty_env_ignores_process_env() {
        env::set_var("STRICTENV_MERGER_PROBE_EMPTY", "present");
        let merged = EnvironmentMerger::build(Some(&EnvMap::new()), None, false, true).unwrap();
        env::remove_var("STRICTENV_MERGER_PROBE_EMPTY");
        assert!(merged.is_empty());
    }
}
