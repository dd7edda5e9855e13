//! Error types for paper-analyzer.
//!
//! [`AgentError`] covers everything that can go wrong between a facet
//! agent and the LLM provider. [`CommandError`] covers the CLI layer.
//! Both fold into the crate-level [`Error`].

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent, provider, or orchestration failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the agent system.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API credential was found in any configured source.
    #[error("API credential not found (checked {checked})")]
    MissingCredential {
        /// Human-readable list of the sources that were consulted.
        checked: String,
    },

    /// Provider name is not recognized.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// The rejected provider name.
        name: String,
    },

    /// A chat role string did not map to a known role.
    #[error("unsupported chat role: {role}")]
    UnsupportedRole {
        /// The rejected role string.
        role: String,
    },

    /// The request was rejected before reaching the provider.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// What was wrong with the request.
        message: String,
    },

    /// The provider call failed (network, auth, or malformed response).
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Provider error message.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// A streaming response failed mid-flight.
    #[error("stream error: {message}")]
    Stream {
        /// Provider error message.
        message: String,
    },

    /// The provider's text broke the structure the facet promised.
    #[error("validation failed: {message}")]
    Validation {
        /// What failed to validate.
        message: String,
        /// The raw text that was rejected.
        content: String,
    },

    /// A provider call exceeded its time budget.
    #[error("provider call timed out after {after:?}")]
    Timeout {
        /// The configured limit that was exceeded.
        after: Duration,
    },

    /// Work was cancelled before it finished.
    #[error("cancelled")]
    Cancelled,

    /// Internal coordination failure (task join, closed mailbox, ...).
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Failure description.
        message: String,
    },
}

/// Coarse classification of a facet failure, recorded in failure markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Provider-side failure.
    Provider,
    /// Output failed structural validation.
    Validation,
    /// Call exceeded its timeout.
    Timeout,
    /// Work was cancelled.
    Cancelled,
    /// Configuration or coordination failure.
    Internal,
}

impl FailureKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Validation => "validation",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AgentError {
    /// Classifies this error for failure markers.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::ApiRequest { .. } | Self::Stream { .. } => FailureKind::Provider,
            Self::Validation { .. } => FailureKind::Validation,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Cancelled => FailureKind::Cancelled,
            Self::MissingCredential { .. }
            | Self::UnsupportedProvider { .. }
            | Self::UnsupportedRole { .. }
            | Self::InvalidRequest { .. }
            | Self::Orchestration { .. } => FailureKind::Internal,
        }
    }
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Input could not be read or parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Command failed while running.
    #[error("command failed: {0}")]
    ExecutionFailed(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),
}
