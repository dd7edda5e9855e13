//! Pluggable LLM provider trait.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into provider-specific SDK calls. This keeps all agent logic decoupled
//! from any particular LLM vendor.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;

/// Stream of text fragments from a streaming completion.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, AgentError>> + Send>>;

/// Trait for LLM provider backends.
///
/// Implementations handle the transport layer for a specific provider
/// while presenting a uniform interface to agents. Timeouts, pacing and
/// fragment observation are layered on top by
/// [`CompletionAdapter`](super::adapter::CompletionAdapter).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"groq"`, `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures or parse errors.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;

    /// Executes a streaming chat completion request.
    ///
    /// Returns a stream of text chunks as they arrive from the provider.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on connection or streaming failures.
    async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream, AgentError>;
}
