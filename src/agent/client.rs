//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use std::sync::Arc;

use crate::agent::config::AgentConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::AgentError;

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"groq"` (default): Groq's OpenAI-compatible endpoint
/// - `"openai"`: `OpenAI` or any compatible API via `base_url`
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(config: &AgentConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match config.provider.to_ascii_lowercase().as_str() {
        "groq" => Ok(Arc::new(OpenAiProvider::groq(config))),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config))),
        _ => Err(AgentError::UnsupportedProvider {
            name: config.provider.clone(),
        }),
    }
}
