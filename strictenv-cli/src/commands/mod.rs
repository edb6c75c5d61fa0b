//! CLI command implementations.
//!
//! - `parse`: Parse and expand a `.env` file
//! - `check`: Validate a `.env` file
//! - `merge`: Merge a `.env` file beneath the process environment
//! - `example`: Generate an example `.env` file for a schema document
//! - `load`: Resolve settings for a schema document
//! - `completions`: Generate shell completion scripts

pub mod check;
pub mod completions;
pub mod example;
pub mod load;
pub mod merge;
pub mod parse;

pub use check::CheckCommand;
pub use completions::CompletionsCommand;
pub use example::ExampleCommand;
pub use load::LoadCommand;
pub use merge::MergeCommand;
pub use parse::ParseCommand;
