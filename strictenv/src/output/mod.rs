//! Output formatting for environment maps.
//!
//! This module renders an [`EnvMap`] as a `.env` document, shell-specific
//! export statements, JSON, or human-readable text. Entries are always
//! written in map order.

mod formatters;
mod shell;

use crate::environment::EnvMap;
use crate::Result;

pub use formatters::{DotenvFormatter, ExportFormatter, HumanFormatter, JsonFormatter};
pub use shell::ShellType;

/// Trait for rendering an environment map in some output format.
pub trait OutputFormatter {
    /// Format the given environment map into a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the formatting fails (e.g., a key that is not a
    /// valid variable name for the target shell).
    fn format(&self, env: &EnvMap) -> Result<String>;
}

/// Available output formats for environment maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Shell-specific export statements.
    Export(ShellType),
    /// JSON object.
    Json,
    /// Dotenv (.env file) format that parses back to the same map.
    Dotenv,
    /// Human-readable format.
    Human,
}

impl OutputFormat {
    /// Create a formatter for this output format.
    #[must_use]
    pub fn create_formatter(&self) -> Box<dyn OutputFormatter> {
        match self {
            Self::Export(shell) => Box::new(ExportFormatter::new(*shell)),
            Self::Json => Box::new(JsonFormatter),
            Self::Dotenv => Box::new(DotenvFormatter),
            Self::Human => Box::new(HumanFormatter),
        }
    }
}
