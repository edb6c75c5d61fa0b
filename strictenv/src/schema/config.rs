//! Loader configuration attached to a root schema.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Options controlling how a root schema is loaded.
///
/// # Examples
///
/// ```
/// use strictenv::SettingsConfig;
///
/// let config = SettingsConfig {
///     env_prefix: "APP_".to_string(),
///     env_nested_delimiter: Some("__".to_string()),
///     max_nested_struct_depth: Some(2),
///     ..SettingsConfig::default()
/// };
/// assert_eq!(config.max_depth().unwrap(), Some(2));
/// assert!(config.strict_env_file);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsConfig {
    /// Prepended to every derived environment key.
    pub env_prefix: String,
    /// Keep key casing instead of uppercasing schema and source keys.
    pub case_sensitive: bool,
    /// Delimiter enabling `PARENT__CHILD` projection into nested fields.
    pub env_nested_delimiter: Option<String>,
    /// Optional `.env` file read beneath the runtime environment.
    pub env_file: Option<PathBuf>,
    /// Raise on env file and key-collision problems instead of degrading.
    pub strict_env_file: bool,
    /// Positive bound on nested schema traversal.
    pub max_nested_struct_depth: Option<i64>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            env_prefix: String::new(),
            case_sensitive: false,
            env_nested_delimiter: None,
            env_file: None,
            strict_env_file: true,
            max_nested_struct_depth: None,
        }
    }
}

impl SettingsConfig {
    /// The validated depth bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configured bound is not positive.
    pub fn max_depth(&self) -> Result<Option<usize>> {
        match self.max_nested_struct_depth {
            None => Ok(None),
            Some(depth) if depth > 0 => usize::try_from(depth)
                .map(Some)
                .map_err(|_| Self::depth_error()),
            Some(_) => Err(Self::depth_error()),
        }
    }

    /// The nested delimiter, ignoring an empty string.
    #[must_use]
    pub fn nested_delimiter(&self) -> Option<&str> {
        self.env_nested_delimiter
            .as_deref()
            .filter(|delimiter| !delimiter.is_empty())
    }

    fn depth_error() -> Error {
        Error::config("max_nested_struct_depth must be a positive integer")
    }
}
