//! Shell detection and export formatting.

use std::env;

use crate::{Error, Result};

/// Supported shell types for export formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    /// Bourne Again Shell (bash).
    Bash,
    /// Z Shell (zsh).
    Zsh,
    /// Friendly Interactive Shell (fish).
    Fish,
    /// `PowerShell`.
    PowerShell,
}

impl ShellType {
    /// Detect the current shell from environment variables.
    ///
    /// Detection precedence:
    /// 1. `ZSH_VERSION` - indicates zsh
    /// 2. `FISH_VERSION` - indicates fish
    /// 3. `PSModulePath` - indicates `PowerShell`
    /// 4. `SHELL` environment variable (path like `/bin/bash`)
    /// 5. Default to bash if unable to determine
    #[must_use]
    pub fn detect() -> Self {
        if env::var_os("ZSH_VERSION").is_some() {
            return Self::Zsh;
        }
        if env::var_os("FISH_VERSION").is_some() {
            return Self::Fish;
        }
        if env::var_os("PSModulePath").is_some() {
            return Self::PowerShell;
        }

        match env::var("SHELL") {
            Ok(shell_path) if shell_path.contains("zsh") => Self::Zsh,
            Ok(shell_path) if shell_path.contains("fish") => Self::Fish,
            Ok(shell_path) if shell_path.contains("pwsh") || shell_path.contains("powershell") => {
                Self::PowerShell
            }
            _ => Self::Bash,
        }
    }

    /// Parse a shell type from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - Shell name (case-insensitive): "bash", "zsh", "fish", "powershell", "pwsh"
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the shell name is not recognized.
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bash" | "sh" => Ok(Self::Bash),
            "zsh" => Ok(Self::Zsh),
            "fish" => Ok(Self::Fish),
            "powershell" | "pwsh" | "ps" => Ok(Self::PowerShell),
            _ => Err(Error::config(format!(
                "unknown shell type '{s}': supported shells are bash, zsh, fish, powershell"
            ))),
        }
    }

    /// Format an export statement for this shell type.
    ///
    /// Values made only of safe characters are written bare; anything else
    /// is quoted the way the shell expects.
    ///
    /// # Examples
    ///
    /// ```
    /// use strictenv::output::ShellType;
    ///
    /// assert_eq!(ShellType::Bash.format_export("PORT", "5000"), "export PORT=5000");
    /// assert_eq!(ShellType::Bash.format_export("MSG", "it's"), r"export MSG='it'\''s'");
    /// assert_eq!(ShellType::Fish.format_export("PORT", "5000"), "set -x PORT 5000");
    /// assert_eq!(ShellType::PowerShell.format_export("PORT", "5000"), "$env:PORT='5000'");
    /// ```
    #[must_use]
    pub fn format_export(&self, var: &str, value: &str) -> String {
        match self {
            Self::Bash | Self::Zsh => format!("export {var}={}", posix_quote(value)),
            Self::Fish => format!("set -x {var} {}", fish_quote(value)),
            Self::PowerShell => format!("$env:{var}='{}'", value.replace('\'', "''")),
        }
    }
}

fn is_shell_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_./:@%+,-".contains(c))
}

fn posix_quote(value: &str) -> String {
    if is_shell_safe(value) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

fn fish_quote(value: &str) -> String {
    if is_shell_safe(value) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\\', r"\\").replace('\'', r"\'"))
    }
}
