//! Error types for the strictenv library.
//!
//! Every failure the loader can report is a variant of [`Error`], built with
//! `thiserror`. File-level variants are only produced in strict mode; the
//! schema-level variants (missing setting, parse, depth, transform) are
//! always fatal.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a strictenv error.
///
/// # Examples
///
/// ```
/// use strictenv::{Error, Result};
///
/// fn example_operation() -> Result<u16> {
///     Ok(8080)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by user transforms and carried as an error source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Stage of the transform pipeline an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformMode {
    /// Runs on the raw string before coercion.
    Before,
    /// Runs on the coerced value.
    After,
    /// Runs on a constructed record.
    Struct,
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
            Self::Struct => write!(f, "struct_after"),
        }
    }
}

/// The main error type for the strictenv library.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured env file does not exist.
    #[error("environment file not found: {}", path.display())]
    EnvFileNotFound {
        /// Configured path.
        path: PathBuf,
    },

    /// The env file exists but could not be read or decoded.
    #[error("failed to read environment file {}: {reason}", path.display())]
    EnvFileRead {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Human-readable read failure.
        reason: String,
        /// Underlying I/O failure, when there is one.
        #[source]
        source: Option<std::io::Error>,
    },

    /// A line of the env file is malformed, or a `${NAME}` reference is
    /// undefined or cyclic.
    #[error("invalid env file format in {}:{line_number}: {reason} ({line:?})", path.display())]
    EnvFileFormat {
        /// Path of the parsed file.
        path: PathBuf,
        /// 1-based line number of the offending entry.
        line_number: usize,
        /// Offending line text, trimmed.
        line: String,
        /// Why the line was rejected.
        reason: String,
    },

    /// Two source keys with different casing collide after uppercasing.
    #[error(
        "case-insensitive key collision: {first_key:?} and {second_key:?} map to {normalized_key:?}"
    )]
    EnvKeyConflict {
        /// Uppercased key both originals map to.
        normalized_key: String,
        /// Original key seen first.
        first_key: String,
        /// Conflicting original key.
        second_key: String,
    },

    /// A required field has no value in any source.
    #[error("missing required setting: {env_key} (field '{field_name}')")]
    MissingSetting {
        /// Field that is missing.
        field_name: String,
        /// Primary environment key expected for the field.
        env_key: String,
    },

    /// A value could not be coerced or failed constraint validation.
    #[error("failed to parse setting '{field}' as {target_type}: {raw_value:?}")]
    Parse {
        /// Dot-joined field path.
        field: String,
        /// Declared target type.
        target_type: String,
        /// Raw input, or a representation of the offending value.
        raw_value: String,
        /// Underlying failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Nested schema traversal exceeded the configured depth.
    #[error(
        "nested struct depth exceeded: path '{field_path}' reached depth {depth}, max allowed is {max_depth}"
    )]
    NestedDepth {
        /// Dot-joined path that went too deep.
        field_path: String,
        /// Depth reached.
        depth: usize,
        /// Configured maximum.
        max_depth: usize,
    },

    /// A transform failed registration or execution.
    #[error(
        "transform failure [{mode}] '{transform_name}' for field '{field}' as {target_type}:{}{}",
        describe_value(.value),
        describe_reason(.reason)
    )]
    Transform {
        /// Field path (or schema name for struct transforms).
        field: String,
        /// Pipeline stage.
        mode: TransformMode,
        /// Registered transform name.
        transform_name: String,
        /// Declared target type.
        target_type: String,
        /// Representation of the value involved, if any.
        value: Option<String>,
        /// Failure details.
        reason: String,
        /// Error returned by the transform itself.
        #[source]
        source: Option<BoxError>,
    },

    /// Loader configuration or schema metadata is invalid.
    #[error("configuration error: {message}")]
    Config {
        /// What is wrong.
        message: String,
    },

    /// A YAML schema document could not be parsed.
    #[error("schema document error: {0}")]
    SchemaDocument(#[from] serde_yaml::Error),

    /// An I/O error occurred outside env file ingestion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_value(value: &Option<String>) -> String {
    value
        .as_ref()
        .map(|value| format!(" value={value}"))
        .unwrap_or_default()
}

fn describe_reason(reason: &str) -> String {
    if reason.is_empty() {
        String::new()
    } else {
        format!(" ({reason})")
    }
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if error reports a required setting with no value.
    ///
    /// # Examples
    ///
    /// ```
    /// use strictenv::Error;
    ///
    /// let err = Error::MissingSetting {
    ///     field_name: "token".into(),
    ///     env_key: "APP_TOKEN".into(),
    /// };
    /// assert!(err.is_missing_setting());
    /// ```
    #[must_use]
    pub fn is_missing_setting(&self) -> bool {
        matches!(self, Self::MissingSetting { .. })
    }

    /// Check if error is a coercion or constraint failure.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Check if error came from the transform pipeline.
    #[must_use]
    pub fn is_transform(&self) -> bool {
        matches!(self, Self::Transform { .. })
    }

    /// Check if error is a nested depth violation.
    #[must_use]
    pub fn is_nested_depth(&self) -> bool {
        matches!(self, Self::NestedDepth { .. })
    }

    /// Check if error was raised while ingesting the env file.
    #[must_use]
    pub fn is_env_file(&self) -> bool {
        matches!(
            self,
            Self::EnvFileNotFound { .. } | Self::EnvFileRead { .. } | Self::EnvFileFormat { .. }
        )
    }
}
