//! Check command implementation.
//!
//! Validates a `.env` file in strict mode and reports the first problem.

use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::Args;
use std::path::PathBuf;
use strictenv::dotenv::parse_env_file;

/// Validate a .env file.
#[derive(Args)]
pub struct CheckCommand {
    /// The .env file to validate
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl CheckCommand {
    /// Execute the check command.
    ///
    /// Validation is always strict; `--non-strict` does not apply.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        match parse_env_file(&self.file, true) {
            Ok(env) => {
                if global.quiet {
                    return Ok(());
                }
                println!("OK ({} keys)", env.len());
                Ok(())
            }
            Err(e) if e.is_env_file() => {
                eprintln!("{e}");
                Err(CliError::SemanticFailure(format!(
                    "{} is not a valid env file",
                    self.file.display()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}
