//! Completion adapter: one normalized call path over an [`LlmProvider`].
//!
//! Validates the message list, issues either a batch or a streaming
//! request, bounds the call with a timeout, and returns one
//! [`Completion`]. In streaming mode every fragment is reported to the
//! observer as it arrives; the returned text is the in-order concatenation
//! of those fragments.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use super::config::AgentConfig;
use super::events::{AnalysisEvent, AnalysisObserver, TracingObserver};
use super::message::{ChatMessage, ChatRequest, TokenUsage};
use super::provider::LlmProvider;
use crate::error::AgentError;

/// Per-call generation options shared by every agent.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Use the provider's streaming endpoint.
    pub stream: bool,
    /// Upper bound on one provider call.
    pub timeout: Duration,
}

impl CompletionOptions {
    /// Derives call options from agent configuration.
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            stream: config.stream,
            timeout: config.timeout,
        }
    }
}

/// Normalized result of one completion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Token usage (streaming responses report none).
    pub usage: TokenUsage,
    /// Finish reason reported by the provider, if any.
    pub finish_reason: Option<String>,
    /// Number of non-empty fragments received (0 for batch calls).
    pub fragments: usize,
}

/// Turns role-tagged message lists into completions from one provider.
pub struct CompletionAdapter {
    provider: Arc<dyn LlmProvider>,
    options: CompletionOptions,
    observer: Arc<dyn AnalysisObserver>,
    cancel: CancellationToken,
}

impl CompletionAdapter {
    /// Creates an adapter over `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, options: CompletionOptions) -> Self {
        Self {
            provider,
            options,
            observer: Arc::new(TracingObserver),
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the observer that receives stream fragments.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn AnalysisObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Stops in-flight calls when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Call options in effect.
    #[must_use]
    pub const fn options(&self) -> &CompletionOptions {
        &self.options
    }

    /// Name of the underlying provider.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Runs one completion.
    ///
    /// `agent` labels fragment events; `json_mode` asks the provider for a
    /// JSON object response.
    ///
    /// # Errors
    ///
    /// - [`AgentError::InvalidRequest`] if `messages` has nothing to act on.
    /// - [`AgentError::ApiRequest`] / [`AgentError::Stream`] on provider failure,
    ///   including a stream that ends without any text.
    /// - [`AgentError::Timeout`] if the call exceeds the configured timeout.
    /// - [`AgentError::Cancelled`] if the cancellation token fires.
    pub async fn complete(
        &self,
        agent: &str,
        messages: Vec<ChatMessage>,
        json_mode: bool,
    ) -> Result<Completion, AgentError> {
        let request = ChatRequest {
            model: self.options.model.clone(),
            messages,
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            json_mode,
            stream: self.options.stream,
        };
        request.validate()?;

        if self.cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let call = async {
            if request.stream {
                self.collect_stream(agent, &request).await
            } else {
                self.batch(&request).await
            }
        };

        let timeout = self.options.timeout;
        tokio::select! {
            result = tokio::time::timeout(timeout, call) => {
                result.map_err(|_| AgentError::Timeout { after: timeout })?
            }
            () = self.cancel.cancelled() => Err(AgentError::Cancelled),
        }
    }

    async fn batch(&self, request: &ChatRequest) -> Result<Completion, AgentError> {
        let response = self.provider.chat(request).await?;
        Ok(Completion {
            text: response.content,
            usage: response.usage,
            finish_reason: response.finish_reason,
            fragments: 0,
        })
    }

    async fn collect_stream(
        &self,
        agent: &str,
        request: &ChatRequest,
    ) -> Result<Completion, AgentError> {
        let mut stream = self.provider.chat_stream(request).await?;
        let mut text = String::new();
        let mut fragments = 0usize;

        while let Some(item) = stream.next().await {
            let fragment = item?;
            if fragment.is_empty() {
                continue;
            }
            self.observer.on_event(&AnalysisEvent::Fragment {
                agent: agent.to_string(),
                text: fragment.clone(),
            });
            text.push_str(&fragment);
            fragments += 1;
        }
        if fragments == 0 {
            return Err(AgentError::Stream {
                message: "stream ended without any content".to_string(),
            });
        }

        Ok(Completion {
            text,
            usage: TokenUsage::default(),
            finish_reason: None,
            fragments,
        })
    }
}

impl std::fmt::Debug for CompletionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionAdapter")
            .field("provider", &self.provider.name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
