//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// paper-analyzer: multi-facet analysis of research paper abstracts.
///
/// Summarizes each abstract, then fans the summary out to facet agents
/// (key findings, trends, strengths and limitations, related work,
/// implementation ideas, citations, future work) and a judge that scores
/// the summary.
#[derive(Parser, Debug)]
#[command(name = "paper-analyzer")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Provider and pacing options shared by commands that call the model.
#[derive(Args, Debug, Clone, Default)]
pub struct AgentArgs {
    /// Provider name (groq, openai).
    #[arg(long)]
    pub provider: Option<String>,

    /// Model identifier.
    #[arg(long)]
    pub model: Option<String>,

    /// Stream responses fragment by fragment.
    #[arg(long)]
    pub stream: bool,

    /// Skip the judge facet.
    #[arg(long)]
    pub no_judge: bool,

    /// Dispatch facets through per-agent mailboxes.
    #[arg(long)]
    pub mailbox: bool,

    /// Maximum facets running at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Minimum spacing between provider calls, in milliseconds.
    #[arg(long)]
    pub request_delay_ms: Option<u64>,

    /// Delay between documents, in milliseconds.
    #[arg(long)]
    pub document_delay_ms: Option<u64>,

    /// Directory containing prompt template files.
    #[arg(long)]
    pub prompt_dir: Option<PathBuf>,

    /// Secret store holding `GROQ_API_KEY`.
    #[arg(long)]
    pub secrets: Option<PathBuf>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one or more papers.
    ///
    /// Reads a JSON document (`{"title", "link", "abstract"}`) or an array
    /// of them from FILE, or from stdin when FILE is omitted or `-`.
    #[command(after_help = r#"Examples:
  paper-analyzer analyze papers.json
  paper-analyzer analyze paper.json --stream --no-judge
  cat feed.json | paper-analyzer --format json analyze
  paper-analyzer analyze papers.json --request-delay-ms 0 --document-delay-ms 0
"#)]
    Analyze {
        /// Input file (JSON document or array). Defaults to stdin.
        file: Option<PathBuf>,

        /// Provider and pacing options.
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Score a summary against its source text.
    #[command(after_help = r#"Examples:
  paper-analyzer judge --original abstract.txt --summary summary.txt
"#)]
    Judge {
        /// File holding the original text.
        #[arg(long)]
        original: PathBuf,

        /// File holding the summary to evaluate.
        #[arg(long)]
        summary: PathBuf,

        /// Provider and pacing options.
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Run one raw completion through the provider adapter.
    #[command(after_help = r#"Examples:
  paper-analyzer complete -m "system=Be brief." -m "user=What is a transformer?"
  paper-analyzer complete --stream -m "user=Hello"
"#)]
    Complete {
        /// Message as ROLE=CONTENT (system, user, assistant). Repeatable.
        #[arg(short, long = "message", required = true)]
        messages: Vec<String>,

        /// Provider and pacing options.
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Write default prompt templates for customization.
    ///
    /// Existing files are left untouched.
    InitPrompts {
        /// Target directory. Defaults to `~/.config/paper-analyzer/prompts`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
