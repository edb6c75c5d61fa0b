//! Merge command implementation.
//!
//! Merges an optional `.env` file beneath the process environment, the way
//! settings loading does, and prints the effective map.

use crate::error::CliError;
use crate::utils::{print_env, FormatArg, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use strictenv::dotenv::is_valid_key;
use strictenv::{EnvMap, EnvironmentMerger};

/// Merge a .env file beneath the process environment.
#[derive(Args)]
pub struct MergeCommand {
    /// The .env file read beneath the process environment
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Keep key casing instead of uppercasing
    #[arg(long)]
    pub case_sensitive: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "dotenv", ignore_case = true)]
    pub format: FormatArg,

    /// Shell for export output (detected when omitted)
    #[arg(long, value_name = "SHELL")]
    pub shell: Option<String>,
}

impl MergeCommand {
    /// Execute the merge command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let format = self.format.resolve(self.shell.as_deref())?;
        let merged = EnvironmentMerger::build(
            None,
            self.env_file.as_deref(),
            self.case_sensitive,
            global.strict(),
        )?;

        // The live environment may hold names no formatter can write back.
        let printable: EnvMap = merged
            .into_iter()
            .filter(|(key, _)| {
                let valid = is_valid_key(key);
                if !valid {
                    log::debug!("skipping non-portable variable name {key:?}");
                }
                valid
            })
            .collect();
        print_env(&printable, format)
    }
}
