//! The single agent implementation behind every facet.
//!
//! A [`FacetAgent`] is a facet table row plus a system prompt. It builds
//! the message list, waits on the shared rate limiter, and issues exactly
//! one completion.

use std::sync::Arc;

use async_trait::async_trait;

use super::adapter::CompletionAdapter;
use super::facet::{Facet, InputSelector};
use super::judge::parse_verdict;
use super::message::{ChatMessage, system_message, user_message};
use super::prompt::{PromptSet, build_judge_prompt};
use super::rate_limit::RateLimiter;
use super::traits::{Agent, FacetInput, FacetOutput};
use crate::error::AgentError;

/// Agent that computes one facet.
#[derive(Debug)]
pub struct FacetAgent {
    facet: Facet,
    system_prompt: String,
    adapter: Arc<CompletionAdapter>,
    limiter: Arc<RateLimiter>,
}

impl FacetAgent {
    /// Creates an agent for `facet` using the prompt from `prompts`.
    #[must_use]
    pub fn new(
        facet: Facet,
        prompts: &PromptSet,
        adapter: Arc<CompletionAdapter>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            facet,
            system_prompt: prompts.get(facet).to_string(),
            adapter,
            limiter,
        }
    }

    /// Creates one agent per facet, in table order.
    #[must_use]
    pub fn all(
        prompts: &PromptSet,
        adapter: &Arc<CompletionAdapter>,
        limiter: &Arc<RateLimiter>,
    ) -> Vec<Self> {
        Facet::ALL
            .into_iter()
            .map(|f| Self::new(f, prompts, Arc::clone(adapter), Arc::clone(limiter)))
            .collect()
    }

    /// The agent's system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Builds the system + user message list for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidRequest`] if `input` is not what this
    /// facet consumes.
    pub fn build_messages(&self, input: &FacetInput) -> Result<Vec<ChatMessage>, AgentError> {
        let user = match (self.facet.spec().input, input) {
            (InputSelector::Document, FacetInput::Document(doc)) => doc.abstract_text.clone(),
            (InputSelector::Summary, FacetInput::Summary(summary)) => summary.clone(),
            (InputSelector::SourceAndSummary, FacetInput::Evaluation { original, summary }) => {
                build_judge_prompt(original, summary)
            }
            (_, other) => {
                return Err(AgentError::InvalidRequest {
                    message: format!(
                        "{} cannot process {} input",
                        self.facet.agent_name(),
                        other.kind()
                    ),
                });
            }
        };
        Ok(vec![
            system_message(&self.system_prompt),
            user_message(&user),
        ])
    }
}

#[async_trait]
impl Agent for FacetAgent {
    fn name(&self) -> &str {
        self.facet.agent_name()
    }

    fn facet(&self) -> Facet {
        self.facet
    }

    async fn process(&self, input: &FacetInput) -> Result<FacetOutput, AgentError> {
        let messages = self.build_messages(input)?;
        self.limiter.wait_before_call().await?;

        let completion = self
            .adapter
            .complete(self.name(), messages, self.facet.spec().json_mode)
            .await?;

        let text = completion.text.trim().to_string();
        if text.is_empty() {
            return Err(AgentError::Validation {
                message: format!("{} returned empty text", self.name()),
                content: completion.text,
            });
        }
        let verdict = if self.facet == Facet::Judge {
            Some(parse_verdict(&text)?)
        } else {
            None
        };

        Ok(FacetOutput {
            facet: self.facet,
            text,
            verdict,
            usage: completion.usage,
        })
    }
}
