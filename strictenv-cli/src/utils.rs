//! Utility functions for CLI operations.
//!
//! Shared global options, output format selection and schema document
//! loading.

use crate::error::CliError;
use clap::ValueEnum;
use std::path::Path;
use strictenv::output::{OutputFormat, OutputFormatter, ShellType};
use strictenv::{EnvMap, SchemaDocument};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
#[allow(dead_code)] // verbose/quiet are consumed by the logger in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Degrade env file problems to warnings.
    pub non_strict: bool,
}

impl GlobalOptions {
    /// Whether env file problems are fatal.
    pub fn strict(&self) -> bool {
        !self.non_strict
    }
}

/// Output format for commands that print an environment map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum FormatArg {
    /// `.env` file format
    Dotenv,
    /// JSON object
    Json,
    /// Shell export statements
    Export,
    /// Human-readable listing
    Human,
}

impl FormatArg {
    /// Resolve to a library output format.
    ///
    /// `shell` only matters for `export`; without it the current shell is
    /// detected.
    pub fn resolve(self, shell: Option<&str>) -> Result<OutputFormat, CliError> {
        Ok(match self {
            FormatArg::Dotenv => OutputFormat::Dotenv,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Human => OutputFormat::Human,
            FormatArg::Export => {
                let shell = match shell {
                    Some(name) => ShellType::from_string(name)
                        .map_err(|e| CliError::InvalidArguments(e.to_string()))?,
                    None => ShellType::detect(),
                };
                OutputFormat::Export(shell)
            }
        })
    }
}

/// Render `env` in `format` and print it to stdout.
pub fn print_env(env: &EnvMap, format: OutputFormat) -> Result<(), CliError> {
    let rendered = format.create_formatter().format(env)?;
    print_text(&rendered);
    Ok(())
}

/// Print text to stdout, ensuring it ends with a newline.
pub fn print_text(text: &str) {
    if text.is_empty() || text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}

/// Load a YAML schema document, reporting a missing file as an argument error.
pub fn load_schema_document(path: &Path) -> Result<SchemaDocument, CliError> {
    if !path.exists() {
        return Err(CliError::InvalidArguments(format!(
            "Schema file not found: {}",
            path.display()
        )));
    }
    Ok(SchemaDocument::from_path(path)?)
}
