//! Example command implementation.
//!
//! Renders the example `.env` document of a YAML schema document, either to
//! stdout or to a file.

use crate::error::CliError;
use crate::utils::{load_schema_document, print_text, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use strictenv::{render_env_example, write_env_example};

/// Generate an example .env file for a schema document.
#[derive(Args)]
pub struct ExampleCommand {
    /// YAML schema document
    #[arg(long, value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Write the example here instead of stdout
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl ExampleCommand {
    /// Execute the example command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let document = load_schema_document(&self.schema)?;
        let root = document.root();

        match self.output {
            Some(path) => {
                write_env_example(root, &path)?;
                if !global.quiet {
                    eprintln!("Wrote example for {} to {}", root.name(), path.display());
                }
            }
            None => print_text(&render_env_example(root)?),
        }
        Ok(())
    }
}
