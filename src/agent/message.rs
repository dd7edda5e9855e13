//! Provider-agnostic message types for LLM communication.
//!
//! These types decouple agent logic from any specific LLM SDK,
//! allowing the same agents to work across Groq, `OpenAI`, etc.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Role of a chat message participant.
///
/// The set is closed: parsing any other role string fails with
/// [`AgentError::UnsupportedRole`] rather than being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

impl Role {
    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(AgentError::UnsupportedRole {
                role: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Message content.
    pub content: String,
}

/// A chat completion request (provider-agnostic).
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier (e.g., "llama-3.1-8b-instant").
    pub model: String,
    /// Ordered conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0.0–2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Request JSON-formatted output.
    pub json_mode: bool,
    /// Stream the response.
    pub stream: bool,
}

impl ChatRequest {
    /// Checks the message list before it is sent anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidRequest`] if the list is empty or
    /// holds only system messages.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.messages.is_empty() {
            return Err(AgentError::InvalidRequest {
                message: "message list is empty".to_string(),
            });
        }
        if self.messages.iter().all(|m| m.role == Role::System) {
            return Err(AgentError::InvalidRequest {
                message: "message list has no user or assistant content to act on".to_string(),
            });
        }
        Ok(())
    }
}

/// Token usage statistics from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Adds another usage record into this one, saturating on overflow.
    pub const fn accumulate(&mut self, other: Self) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// A chat completion response (provider-agnostic).
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text content.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Finish reason from the model (e.g., `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

/// Creates a system message.
#[must_use]
pub fn system_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::System,
        content: content.to_string(),
    }
}

/// Creates a user message.
#[must_use]
pub fn user_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::User,
        content: content.to_string(),
    }
}

/// Creates an assistant message.
#[must_use]
pub fn assistant_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::Assistant,
        content: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: "test".to_string(),
            messages,
            temperature: None,
            max_tokens: None,
            json_mode: false,
            stream: false,
        }
    }

    #[test]
    fn test_system_message() {
        let msg = system_message("You are helpful.");
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.content, "You are helpful.");
    }

    #[test]
    fn test_user_and_assistant_message() {
        assert_eq!(user_message("Hello").role, Role::User);
        assert_eq!(assistant_message("Hi").role, Role::Assistant);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("system".parse::<Role>().ok(), Some(Role::System));
        assert_eq!("User".parse::<Role>().ok(), Some(Role::User));
        assert_eq!(" assistant ".parse::<Role>().ok(), Some(Role::Assistant));
    }

    #[test]
    fn test_role_from_str_rejects_unknown() {
        let err = "tool".parse::<Role>();
        assert!(matches!(err, Err(AgentError::UnsupportedRole { ref role }) if role == "tool"));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::System).unwrap_or_default();
        assert_eq!(json, "\"system\"");
        let bad: Result<ChatMessage, _> =
            serde_json::from_str(r#"{"role": "function", "content": "x"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_empty() {
        assert!(matches!(
            request(Vec::new()).validate(),
            Err(AgentError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_validate_system_only() {
        let req = request(vec![system_message("a"), system_message("b")]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_ok() {
        let req = request(vec![system_message("a"), user_message("b")]);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_usage_accumulate() {
        let mut total = TokenUsage::default();
        total.accumulate(TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        total.accumulate(TokenUsage {
            prompt_tokens: u32::MAX,
            completion_tokens: 1,
            total_tokens: 1,
        });
        assert_eq!(total.prompt_tokens, u32::MAX);
        assert_eq!(total.completion_tokens, 6);
        assert_eq!(total.total_tokens, 16);
    }
}
