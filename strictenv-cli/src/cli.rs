//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    CheckCommand, CompletionsCommand, ExampleCommand, LoadCommand, MergeCommand, ParseCommand,
};
use clap::{Parser, Subcommand};

/// Inspect `.env` files and resolve typed settings schemas.
#[derive(Parser)]
#[command(name = "strictenv")]
#[command(version, about = "Inspect .env files and resolve settings schemas", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Degrade env file problems to warnings instead of failing
    #[arg(long, global = true, env = "STRICTENV_NON_STRICT")]
    pub non_strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Parse and expand a .env file
    Parse(ParseCommand),

    /// Validate a .env file
    Check(CheckCommand),

    /// Merge a .env file beneath the process environment
    Merge(MergeCommand),

    /// Generate an example .env file for a schema document
    Example(ExampleCommand),

    /// Resolve settings for a schema document
    Load(LoadCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
