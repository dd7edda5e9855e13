//! Layered API credential resolution.
//!
//! The local secret store (a `secrets.toml` file) is checked first, then
//! the environment. Running out of sources is fatal at construction time.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::AgentError;

/// Default secret store location, relative to the working directory.
pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";

/// Key looked up in both the secret store and the environment.
pub const DEFAULT_KEY_NAME: &str = "GROQ_API_KEY";

/// Resolves an API key from a secret store file and environment variables.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    secrets_path: PathBuf,
    key_name: String,
    env_vars: Vec<String>,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_SECRETS_FILE))
    }
}

impl CredentialResolver {
    /// Creates a resolver reading `secrets_path`, falling back to
    /// `$GROQ_API_KEY`.
    #[must_use]
    pub fn new(secrets_path: impl Into<PathBuf>) -> Self {
        Self {
            secrets_path: secrets_path.into(),
            key_name: DEFAULT_KEY_NAME.to_string(),
            env_vars: vec![DEFAULT_KEY_NAME.to_string()],
        }
    }

    /// Replaces the environment fallback chain.
    #[must_use]
    pub fn with_env_vars<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_vars = vars.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the key name looked up inside the secret store.
    #[must_use]
    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    /// Resolves the key against the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MissingCredential`] if no source yields a key.
    pub fn resolve(&self) -> Result<String, AgentError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolves the key using `env` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MissingCredential`] if no source yields a key.
    pub fn resolve_with<F>(&self, env: F) -> Result<String, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = self.read_secret_store() {
            debug!(path = %self.secrets_path.display(), "credential loaded from secret store");
            return Ok(key);
        }

        for var in &self.env_vars {
            if let Some(key) = env(var).map(|v| v.trim().to_string())
                && !key.is_empty()
            {
                debug!(var, "credential loaded from environment");
                return Ok(key);
            }
        }

        let mut checked = vec![self.secrets_path.display().to_string()];
        checked.extend(self.env_vars.iter().map(|v| format!("${v}")));
        Err(AgentError::MissingCredential {
            checked: checked.join(", "),
        })
    }

    /// Reads the key from the secret store, if present and well-formed.
    ///
    /// A malformed store is logged and treated as absent so the
    /// environment fallback still applies.
    fn read_secret_store(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.secrets_path).ok()?;
        match parse_secret(&content, &self.key_name) {
            Ok(found) => found,
            Err(e) => {
                warn!(path = %self.secrets_path.display(), error = %e, "ignoring unreadable secret store");
                None
            }
        }
    }

    /// Path of the secret store this resolver reads.
    #[must_use]
    pub fn secrets_path(&self) -> &Path {
        &self.secrets_path
    }
}

/// Extracts a non-empty string value for `key` from TOML `content`.
fn parse_secret(content: &str, key: &str) -> Result<Option<String>, toml::de::Error> {
    let table: toml::Table = content.parse()?;
    Ok(table
        .get(key)
        .and_then(toml::Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, content).unwrap_or_else(|_| unreachable!());
        (dir, path)
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_secret_store_wins_over_env() {
        let (_dir, path) = store("GROQ_API_KEY = \"from-file\"\n");
        let key = CredentialResolver::new(path)
            .resolve_with(|_| Some("from-env".to_string()))
            .unwrap_or_default();
        assert_eq!(key, "from-file");
    }

    #[test]
    fn test_env_fallback_when_store_missing() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let key = CredentialResolver::new(dir.path().join("absent.toml"))
            .resolve_with(|name| (name == "GROQ_API_KEY").then(|| "from-env".to_string()))
            .unwrap_or_default();
        assert_eq!(key, "from-env");
    }

    #[test]
    fn test_env_fallback_when_store_lacks_key() {
        let (_dir, path) = store("OTHER = \"x\"\n");
        let key = CredentialResolver::new(path)
            .with_env_vars(["PAPER_API_KEY"])
            .resolve_with(|name| (name == "PAPER_API_KEY").then(|| " padded ".to_string()))
            .unwrap_or_default();
        assert_eq!(key, "padded");
    }

    #[test]
    fn test_malformed_store_falls_back() {
        let (_dir, path) = store("GROQ_API_KEY = \n");
        let key = CredentialResolver::new(path)
            .resolve_with(|_| Some("env".to_string()))
            .unwrap_or_default();
        assert_eq!(key, "env");
    }

    #[test]
    fn test_missing_everywhere() {
        let (_dir, path) = store("GROQ_API_KEY = \"\"\n");
        let err = CredentialResolver::new(path)
            .with_env_vars(["A", "B"])
            .resolve_with(no_env);
        match err {
            Err(AgentError::MissingCredential { checked }) => {
                assert!(checked.contains("$A"));
                assert!(checked.contains("$B"));
            }
            other => unreachable!("expected MissingCredential, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_key_name() {
        let (_dir, path) = store("OPENAI_API_KEY = \"sk-test\"\n");
        let key = CredentialResolver::new(path)
            .with_key_name("OPENAI_API_KEY")
            .resolve_with(no_env)
            .unwrap_or_default();
        assert_eq!(key, "sk-test");
    }
}
