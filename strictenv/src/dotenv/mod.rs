//! `.env` file engine.
//!
//! Parsing happens in two passes:
//!
//! 1. [`parser`] turns physical lines into `KEY -> value` entries, handling
//!    comments, the `export` prefix, single/double quoting with escapes,
//!    multi-line quoted values and inline comments.
//! 2. [`expand`] substitutes `${NAME}` references, first against the file's
//!    own keys (recursively, with cycle detection) and then against the live
//!    process environment.
//!
//! In strict mode every malformed line, bad quote or unresolvable reference
//! is an [`Error::EnvFileFormat`](crate::Error::EnvFileFormat). In lenient
//! mode the offending line is skipped (with a warning) and unresolved
//! references expand to the empty string.
//!
//! # Examples
//!
//! ```
//! use std::path::Path;
//! use strictenv::dotenv::parse_env_str;
//!
//! let content = "HOST=localhost\nPORT=5432\nURL=\"http://${HOST}:${PORT}\"\n";
//! let values = parse_env_str(content, Path::new(".env"), true).unwrap();
//! assert_eq!(values.get("URL"), Some("http://localhost:5432"));
//! ```

pub mod expand;
pub mod parser;

#[cfg(test)]
mod proptests;

pub use parser::{parse_env_file, parse_env_str, parse_env_str_with};

/// Returns true if `name` is a valid variable name: `[A-Za-z_][A-Za-z0-9_]*`.
///
/// # Examples
///
/// ```
/// use strictenv::dotenv::is_valid_key;
///
/// assert!(is_valid_key("_DB_HOST2"));
/// assert!(!is_valid_key("2FAST"));
/// assert!(!is_valid_key("BAD-KEY"));
/// ```
#[must_use]
pub fn is_valid_key(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
