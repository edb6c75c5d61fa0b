//! Build script for strictenv-cli.
//!
//! Generates the man page at build time using clap_mangen and places it in
//! OUT_DIR.
//!
//! The command structure is rebuilt here because build scripts cannot depend
//! on the crate being built.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// Keep this structure synchronized with src/cli.rs.
fn build_cli() -> Command {
    Command::new("strictenv")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect .env files and resolve settings schemas")
        .long_about(
            "Command-line tool for parsing .env files and resolving typed settings schemas from the environment",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("non-strict")
                .long("non-strict")
                .help("Degrade env file problems to warnings instead of failing")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .env("STRICTENV_NON_STRICT"),
        )
        .subcommands(vec![
            Command::new("parse")
                .about("Parse and expand a .env file")
                .long_about("Parse a .env file, expand variable references and print the result"),
            Command::new("check")
                .about("Validate a .env file")
                .long_about("Validate a .env file strictly and report the first problem"),
            Command::new("merge")
                .about("Merge a .env file beneath the process environment")
                .long_about("Print the effective environment a settings load would see"),
            Command::new("example")
                .about("Generate an example .env file for a schema document")
                .long_about("Render an example .env file for the root schema of a YAML schema document"),
            Command::new("load")
                .about("Resolve settings for a schema document")
                .long_about("Resolve the root schema of a YAML schema document and print it as JSON"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("strictenv.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
