//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! The API key follows its own chain: explicit value → secret store → environment
//! (see [`CredentialResolver`]).

use std::path::PathBuf;
use std::time::Duration;

use super::credentials::{CredentialResolver, DEFAULT_KEY_NAME, DEFAULT_SECRETS_FILE};
use crate::error::AgentError;

/// Default model identifier.
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default maximum output tokens per facet.
const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default delay before every provider call.
const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(2);
/// Default delay between successive documents.
const DEFAULT_DOCUMENT_DELAY: Duration = Duration::from_secs(5);
/// Default cap on concurrently running facets per document.
const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Secondary environment variable for the API key.
const FALLBACK_KEY_ENV: &str = "PAPER_API_KEY";

/// How the coordinator hands work to facet agents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Call each agent directly.
    #[default]
    Direct,
    /// Route each call through the agent's inbound mailbox.
    Mailbox,
}

/// Configuration for the agent system.
#[derive(Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "groq", "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model used by every facet agent.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens per facet response.
    pub max_tokens: u32,
    /// Stream provider responses fragment by fragment.
    pub stream: bool,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Minimum spacing between provider calls, applied before every call.
    pub request_delay: Duration,
    /// Delay applied before each document after the first.
    pub document_delay: Duration,
    /// Maximum facets running at once for one document.
    pub max_concurrency: usize,
    /// Schedule the judge facet.
    pub judge: bool,
    /// Direct calls or mailbox transport.
    pub dispatch: DispatchMode,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("stream", &self.stream)
            .field("timeout", &self.timeout)
            .field("request_delay", &self.request_delay)
            .field("document_delay", &self.document_delay)
            .field("max_concurrency", &self.max_concurrency)
            .field("judge", &self.judge)
            .field("dispatch", &self.dispatch)
            .field("prompt_dir", &self.prompt_dir)
            .finish()
    }
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MissingCredential`] if no API key is found, or
    /// [`AgentError::InvalidRequest`] if `PAPER_TIMEOUT_SECS` is zero.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    stream: Option<bool>,
    timeout: Option<Duration>,
    request_delay: Option<Duration>,
    document_delay: Option<Duration>,
    max_concurrency: Option<usize>,
    judge: Option<bool>,
    dispatch: Option<DispatchMode>,
    prompt_dir: Option<PathBuf>,
    secrets_path: Option<PathBuf>,
    api_key_env: Option<Vec<String>>,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    ///
    /// The API key is not read here; [`Self::build`] resolves it from the
    /// secret store before the environment.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("PAPER_PROVIDER").ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("PAPER_BASE_URL").ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("PAPER_MODEL").ok();
        }
        if self.temperature.is_none() {
            self.temperature = env_parse("PAPER_TEMPERATURE");
        }
        if self.max_tokens.is_none() {
            self.max_tokens = env_parse("PAPER_MAX_TOKENS");
        }
        if self.stream.is_none() {
            self.stream = env_flag("PAPER_STREAM");
        }
        if self.timeout.is_none() {
            self.timeout = env_parse("PAPER_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.request_delay.is_none() {
            self.request_delay = env_parse("PAPER_REQUEST_DELAY_MS").map(Duration::from_millis);
        }
        if self.document_delay.is_none() {
            self.document_delay = env_parse("PAPER_DOCUMENT_DELAY_MS").map(Duration::from_millis);
        }
        if self.max_concurrency.is_none() {
            self.max_concurrency = env_parse("PAPER_MAX_CONCURRENCY");
        }
        if self.judge.is_none() {
            self.judge = env_flag("PAPER_JUDGE");
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("PAPER_PROMPT_DIR").ok().map(PathBuf::from);
        }
        if self.secrets_path.is_none() {
            self.secrets_path = std::env::var("PAPER_SECRETS_PATH").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key, bypassing the secret store and environment.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the maximum tokens per response.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Enables or disables streaming responses.
    #[must_use]
    pub const fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the minimum delay before every provider call.
    #[must_use]
    pub const fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    /// Sets the delay between successive documents.
    #[must_use]
    pub const fn document_delay(mut self, delay: Duration) -> Self {
        self.document_delay = Some(delay);
        self
    }

    /// Sets the maximum concurrency.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// Enables or disables the judge facet.
    #[must_use]
    pub const fn judge(mut self, enabled: bool) -> Self {
        self.judge = Some(enabled);
        self
    }

    /// Sets the dispatch mode.
    #[must_use]
    pub const fn dispatch(mut self, mode: DispatchMode) -> Self {
        self.dispatch = Some(mode);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the secret store path consulted for the API key.
    #[must_use]
    pub fn secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_path = Some(path.into());
        self
    }

    /// Replaces the environment variables consulted for the API key.
    #[must_use]
    pub fn api_key_env<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_key_env = Some(vars.into_iter().map(Into::into).collect());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// - [`AgentError::InvalidRequest`] if the timeout is zero.
    /// - [`AgentError::MissingCredential`] if no API key was set and
    ///   neither the secret store nor the environment provides one.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        if timeout.is_zero() {
            return Err(AgentError::InvalidRequest {
                message: "timeout must be greater than zero".to_string(),
            });
        }

        let api_key = match self.api_key {
            Some(key) => key,
            None => {
                let env_vars = self.api_key_env.unwrap_or_else(|| {
                    vec![DEFAULT_KEY_NAME.to_string(), FALLBACK_KEY_ENV.to_string()]
                });
                CredentialResolver::new(
                    self.secrets_path
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_FILE)),
                )
                .with_env_vars(env_vars)
                .resolve()?
            }
        };

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "groq".to_string()),
            api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            stream: self.stream.unwrap_or(false),
            timeout,
            request_delay: self.request_delay.unwrap_or(DEFAULT_REQUEST_DELAY),
            document_delay: self.document_delay.unwrap_or(DEFAULT_DOCUMENT_DELAY),
            max_concurrency: self
                .max_concurrency
                .unwrap_or(DEFAULT_MAX_CONCURRENCY)
                .max(1),
            judge: self.judge.unwrap_or(true),
            dispatch: self.dispatch.unwrap_or_default(),
            prompt_dir: self.prompt_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "groq");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!((config.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(!config.stream);
        assert_eq!(config.request_delay, Duration::from_secs(2));
        assert_eq!(config.document_delay, Duration::from_secs(5));
        assert!(config.judge);
        assert_eq!(config.dispatch, DispatchMode::Direct);
    }

    #[test]
    fn test_builder_missing_api_key() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let result = AgentConfig::builder()
            .secrets_path(dir.path().join("secrets.toml"))
            .api_key_env(["PAPER_ANALYZER_TEST_UNSET_KEY"])
            .build();
        assert!(matches!(result, Err(AgentError::MissingCredential { .. })));
    }

    #[test]
    fn test_builder_reads_secret_store() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "GROQ_API_KEY = \"gsk-file\"\n").unwrap_or_else(|_| unreachable!());
        let config = AgentConfig::builder()
            .secrets_path(&path)
            .api_key_env(["PAPER_ANALYZER_TEST_UNSET_KEY"])
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.api_key, "gsk-file");
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AgentConfig::builder()
            .api_key("key")
            .provider("openai")
            .model("gpt-4o-mini")
            .stream(true)
            .judge(false)
            .max_concurrency(0)
            .request_delay(Duration::ZERO)
            .timeout(Duration::from_secs(30))
            .dispatch(DispatchMode::Mailbox)
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(config.stream);
        assert!(!config.judge);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.request_delay, Duration::ZERO);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.dispatch, DispatchMode::Mailbox);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = AgentConfig::builder()
            .api_key("key")
            .timeout(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(AgentError::InvalidRequest { .. })));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AgentConfig::builder()
            .api_key("super-secret")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
