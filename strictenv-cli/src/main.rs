//! Main entry point for the strictenv CLI.
//!
//! Commands for working with `.env` files and settings schemas:
//! - `parse`: Parse and expand a `.env` file
//! - `check`: Validate a `.env` file
//! - `merge`: Merge a `.env` file beneath the process environment
//! - `example`: Generate an example `.env` file for a schema
//! - `load`: Resolve settings for a schema

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    strictenv::init_logger(cli.verbose, cli.quiet).install();

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        non_strict: cli.non_strict,
    };

    let result = match cli.command {
        cli::Command::Parse(cmd) => cmd.execute(&global),
        cli::Command::Check(cmd) => cmd.execute(&global),
        cli::Command::Merge(cmd) => cmd.execute(&global),
        cli::Command::Example(cmd) => cmd.execute(&global),
        cli::Command::Load(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
