//! # paper-analyzer
//!
//! Multi-facet analysis of research paper abstracts with LLM agents.
//!
//! Each paper is summarized first. The summary then feeds a set of facet
//! agents that run concurrently: key findings, trends, strengths and
//! limitations, related work, implementation ideas, citations, future
//! work, and a judge that scores the summary against the abstract.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use paper_analyzer::agent::{AgentConfig, Coordinator, Document, create_provider};
//!
//! # async fn run() -> paper_analyzer::Result<()> {
//! let config = AgentConfig::from_env()?;
//! let provider = create_provider(&config)?;
//! let coordinator = Coordinator::new(provider, config)?;
//!
//! let doc = Document::new("Title", "https://arxiv.org/abs/0000.0000", "An abstract.");
//! let result = coordinator.analyze_document(&doc).await;
//! println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod error;

pub use error::{AgentError, CommandError, Error, Result};
