//! CLI layer for paper-analyzer.
//!
//! Provides the command-line interface using clap, with commands for
//! analyzing papers, judging summaries, raw completions, and prompt setup.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{AgentArgs, Cli, Commands};
