//! `OpenAI`-compatible provider using the `async-openai` crate.
//!
//! Serves Groq (the default) and `OpenAI` itself, plus any compatible
//! endpoint reachable through the base URL override in [`AgentConfig`].

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionResponse, CreateChatCompletionStreamResponse, ResponseFormat,
};
use async_trait::async_trait;
use futures_util::StreamExt;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::{FragmentStream, LlmProvider};
use crate::error::AgentError;

/// Groq's `OpenAI`-compatible endpoint.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// `OpenAI`-compatible LLM provider.
///
/// Wraps the `async-openai` client for chat completions.
pub struct OpenAiProvider {
    name: &'static str,
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Creates an `OpenAI` provider from agent configuration.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self::with_default_base("openai", config, None)
    }

    /// Creates a Groq provider from agent configuration.
    #[must_use]
    pub fn groq(config: &AgentConfig) -> Self {
        Self::with_default_base("groq", config, Some(GROQ_API_BASE))
    }

    fn with_default_base(
        name: &'static str,
        config: &AgentConfig,
        default_base: Option<&str>,
    ) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(base_url) = config.base_url.as_deref().or(default_base) {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            name,
            client: Client::with_config(openai_config),
        }
    }

    /// Converts our message type to the `OpenAI` SDK type.
    fn convert_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        match msg.role {
            Role::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                    name: None,
                })
            }
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                name: None,
            }),
            Role::Assistant => {
                #[allow(deprecated)]
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                        msg.content.clone(),
                    )),
                    name: None,
                    tool_calls: None,
                    refusal: None,
                    audio: None,
                    function_call: None,
                })
            }
        }
    }

    /// Builds an `OpenAI` chat completion request from our generic request.
    fn build_request(request: &ChatRequest) -> CreateChatCompletionRequest {
        let messages: Vec<_> = request.messages.iter().map(Self::convert_message).collect();

        let response_format = if request.json_mode {
            Some(ResponseFormat::JsonObject)
        } else {
            None
        };

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
            max_completion_tokens: request.max_tokens,
            stream: if request.stream { Some(true) } else { None },
            response_format,
            ..Default::default()
        }
    }
}

fn api_error(error: OpenAIError) -> AgentError {
    let status = match &error {
        OpenAIError::Reqwest(e) => e.status().map(|s| s.as_u16()),
        _ => None,
    };
    AgentError::ApiRequest {
        message: error.to_string(),
        status,
    }
}

/// Maps a batch response, rejecting one without a choice or message content.
fn map_response(response: CreateChatCompletionResponse) -> Result<ChatResponse, AgentError> {
    let malformed = |message: &str| AgentError::ApiRequest {
        message: message.to_string(),
        status: None,
    };

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| malformed("response contained no choices"))?;
    let content = choice
        .message
        .content
        .ok_or_else(|| malformed("response message had no content"))?;
    let finish_reason = choice
        .finish_reason
        .map(|fr| format!("{fr:?}").to_lowercase());

    let usage = response
        .usage
        .map_or_else(TokenUsage::default, |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

    Ok(ChatResponse {
        content,
        usage,
        finish_reason,
    })
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("client", &"<async-openai::Client>")
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let openai_request = Self::build_request(request);

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(api_error)?;
        map_response(response)
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream, AgentError> {
        let mut stream_request = request.clone();
        stream_request.stream = true;
        let openai_request = Self::build_request(&stream_request);

        let stream = self
            .client
            .chat()
            .create_stream(openai_request)
            .await
            .map_err(api_error)?;

        let mapped = stream.map(
            |result: Result<CreateChatCompletionStreamResponse, OpenAIError>| match result {
                Ok(response) => Ok(response
                    .choices
                    .first()
                    .and_then(|c| c.delta.content.as_ref())
                    .cloned()
                    .unwrap_or_default()),
                Err(e) => Err(AgentError::Stream {
                    message: e.to_string(),
                }),
            },
        );

        Ok(Box::pin(mapped))
    }
}
