//! Agent trait definition.
//!
//! Every facet agent, direct or behind a mailbox, implements this trait,
//! which gives the coordinator one uniform interface.

use async_trait::async_trait;

use super::analysis::Document;
use super::facet::Facet;
use super::judge::JudgeVerdict;
use super::message::TokenUsage;
use crate::error::AgentError;

/// What an agent is asked to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetInput {
    /// A document (summary facet).
    Document(Document),
    /// Summary text (dependent facets).
    Summary(String),
    /// Abstract and summary (judge facet).
    Evaluation {
        /// The original abstract.
        original: String,
        /// The summary under evaluation.
        summary: String,
    },
}

impl FacetInput {
    /// Short label of the variant for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Summary(_) => "summary",
            Self::Evaluation { .. } => "evaluation",
        }
    }
}

/// What an agent produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetOutput {
    /// Facet that produced this output.
    pub facet: Facet,
    /// Generated text, trimmed.
    pub text: String,
    /// Parsed verdict (judge facet only).
    pub verdict: Option<JudgeVerdict>,
    /// Token usage for the call.
    pub usage: TokenUsage,
}

/// Trait implemented by all agents in the system.
///
/// An agent owns a fixed system prompt for one facet. The coordinator
/// calls [`Agent::process`] with the facet's input and receives its text.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &str;

    /// Facet this agent computes.
    fn facet(&self) -> Facet;

    /// Processes one input.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on provider failure, timeout, cancellation,
    /// an input that does not match the facet, or (for the judge) a
    /// response that is not a valid verdict.
    async fn process(&self, input: &FacetInput) -> Result<FacetOutput, AgentError>;
}
