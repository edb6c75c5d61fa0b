//! Parse command implementation.
//!
//! Parses a `.env` file, expands variable references and prints the result.

use crate::error::CliError;
use crate::utils::{print_env, FormatArg, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use strictenv::dotenv::parse_env_file;

/// Parse and expand a .env file.
#[derive(Args)]
pub struct ParseCommand {
    /// The .env file to parse
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "dotenv", ignore_case = true)]
    pub format: FormatArg,

    /// Shell for export output (detected when omitted)
    #[arg(long, value_name = "SHELL")]
    pub shell: Option<String>,
}

impl ParseCommand {
    /// Execute the parse command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let format = self.format.resolve(self.shell.as_deref())?;
        let env = parse_env_file(&self.file, global.strict())?;
        log::debug!("parsed {} keys from {}", env.len(), self.file.display());
        print_env(&env, format)
    }
}
