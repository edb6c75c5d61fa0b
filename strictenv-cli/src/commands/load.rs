//! Load command implementation.
//!
//! Resolves the root schema of a YAML schema document from the process
//! environment and prints the resolved record as JSON.

use crate::error::CliError;
use crate::utils::{load_schema_document, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use strictenv::SettingsLoader;

/// Resolve settings for a schema document.
#[derive(Args)]
pub struct LoadCommand {
    /// YAML schema document
    #[arg(long, value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// The .env file read beneath the process environment (overrides the document)
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<PathBuf>,
}

impl LoadCommand {
    /// Execute the load command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let document = load_schema_document(&self.schema)?;
        let root = document.root();

        let mut config = root.config().cloned().unwrap_or_default();
        if let Some(env_file) = self.env_file {
            config.env_file = Some(env_file);
        }
        if global.non_strict {
            config.strict_env_file = false;
        }

        let record = SettingsLoader::new(root).with_config(config).load_record()?;
        let json = serde_json::to_string_pretty(&record.to_json())
            .map_err(|e| CliError::Config(format!("failed to serialize settings: {e}")))?;
        println!("{json}");
        Ok(())
    }
}
