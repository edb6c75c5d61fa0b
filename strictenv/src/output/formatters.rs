//! Output formatter implementations.

use crate::dotenv::is_valid_key;
use crate::environment::EnvMap;
use crate::{Error, Result};

use super::{OutputFormatter, ShellType};

fn check_key(key: &str) -> Result<()> {
    if is_valid_key(key) {
        return Ok(());
    }
    Err(Error::config(format!(
        "invalid environment variable name '{key}': must contain only alphanumeric characters and underscores, and start with a letter or underscore"
    )))
}

/// Formatter for shell-specific export statements.
pub struct ExportFormatter {
    shell: ShellType,
}

impl ExportFormatter {
    /// Create a new export formatter for `shell`.
    #[must_use]
    pub fn new(shell: ShellType) -> Self {
        Self { shell }
    }
}

impl OutputFormatter for ExportFormatter {
    fn format(&self, env: &EnvMap) -> Result<String> {
        let mut exports = Vec::with_capacity(env.len());
        for (key, value) in env.iter() {
            check_key(key)?;
            exports.push(self.shell.format_export(key, value));
        }
        Ok(exports.join("\n"))
    }
}

/// Formatter for JSON output.
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, env: &EnvMap) -> Result<String> {
        serde_json::to_string_pretty(env)
            .map_err(|e| Error::config(format!("failed to serialize to JSON: {e}")))
    }
}

/// Formatter for dotenv (.env file) format.
///
/// Output parses back to the same map: values outside a conservative plain
/// character set are double-quoted, with backslashes, quotes, line breaks,
/// tabs and `$` escaped.
///
/// # Examples
///
/// ```
/// use strictenv::output::{DotenvFormatter, OutputFormatter};
/// use strictenv::EnvMap;
///
/// let env: EnvMap = [("HOST", "localhost"), ("GREETING", "hello world"), ("EMPTY", "")]
///     .into_iter()
///     .collect();
/// assert_eq!(
///     DotenvFormatter.format(&env).unwrap(),
///     "HOST=localhost\nGREETING=\"hello world\"\nEMPTY=\n"
/// );
/// ```
pub struct DotenvFormatter;

impl DotenvFormatter {
    fn is_plain(value: &str) -> bool {
        value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_./:@%+,-".contains(c))
    }

    fn quote(value: &str) -> String {
        let mut quoted = String::with_capacity(value.len() + 2);
        quoted.push('"');
        for c in value.chars() {
            match c {
                '\\' => quoted.push_str(r"\\"),
                '"' => quoted.push_str("\\\""),
                '\n' => quoted.push_str(r"\n"),
                '\r' => quoted.push_str(r"\r"),
                '\t' => quoted.push_str(r"\t"),
                '$' => quoted.push_str(r"\$"),
                other => quoted.push(other),
            }
        }
        quoted.push('"');
        quoted
    }
}

impl OutputFormatter for DotenvFormatter {
    fn format(&self, env: &EnvMap) -> Result<String> {
        let mut rendered = String::new();
        for (key, value) in env.iter() {
            check_key(key)?;
            rendered.push_str(key);
            rendered.push('=');
            if Self::is_plain(value) {
                rendered.push_str(value);
            } else {
                rendered.push_str(&Self::quote(value));
            }
            rendered.push('\n');
        }
        Ok(rendered)
    }
}

/// Formatter for human-readable output.
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format(&self, env: &EnvMap) -> Result<String> {
        if env.is_empty() {
            return Ok("No variables defined.".to_string());
        }

        let width = env.keys().map(str::len).max().unwrap_or(0);
        let mut lines = vec![format!("Environment ({} variables):", env.len())];
        for (key, value) in env.iter() {
            lines.push(format!("  {key:<width$}  {value:?}"));
        }
        Ok(lines.join("\n"))
    }
}
