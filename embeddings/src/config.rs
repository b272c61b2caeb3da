//! Configuration for the embedding service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EmbeddingError, Result};

/// Chunks sent to a provider per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Pause between consecutive batches.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 100;

/// Pause between consecutive requests of a single-item provider.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 50;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the embedding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Chunks per provider batch.
    pub batch_size: usize,

    /// Pause between batches, in milliseconds.
    pub batch_delay_ms: u64,

    /// Pause between per-text requests of single-item providers, in milliseconds.
    pub request_delay_ms: u64,

    /// Base URL of the OpenAI API.
    pub openai_base_url: String,

    /// Base URL of the Gemini API.
    pub gemini_base_url: String,

    /// Where configured API keys are persisted. Falls back to the user
    /// config directory when unset.
    pub credentials_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            credentials_path: None,
        }
    }
}

impl ServiceConfig {
    /// Default configuration with base URL overrides from the environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Load configuration from a TOML file, then apply environment overrides.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&content)?;
        debug!("Loaded service config from {}", path.display());

        let config = config.with_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `OPENAI_BASE_URL` / `GEMINI_BASE_URL` overrides from `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|url| !url.is_empty()) {
            self.openai_base_url = url;
        }
        if let Some(url) = lookup("GEMINI_BASE_URL").filter(|url| !url.is_empty()) {
            self.gemini_base_url = url;
        }
        self
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EmbeddingError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the pause between batches.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the pause between single-item requests.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the OpenAI base URL.
    pub fn with_openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = url.into();
        self
    }

    /// Set the Gemini base URL.
    pub fn with_gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.gemini_base_url = url.into();
        self
    }

    /// Set the credentials file.
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Credentials file to use, if any location is available.
    pub fn resolved_credentials_path(&self) -> Option<PathBuf> {
        self.credentials_path
            .clone()
            .or_else(default_credentials_path)
    }
}

/// `<config dir>/gemcraft/credentials.json`.
pub fn default_credentials_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gemcraft").join("credentials.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.batch_delay(), Duration::from_millis(100));
        assert_eq!(config.request_delay(), Duration::from_millis(50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = ServiceConfig::default().with_env_overrides(|name| match name {
            "OPENAI_BASE_URL" => Some("http://localhost:9000/v1".to_string()),
            "GEMINI_BASE_URL" => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.openai_base_url, "http://localhost:9000/v1");
        assert_eq!(config.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let config = ServiceConfig::default().with_batch_size(0);
        assert!(matches!(config.validate(), Err(EmbeddingError::Config(_))));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str("batch_size = 25\nbatch_delay_ms = 0\n").unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.batch_delay(), Duration::ZERO);
        assert_eq!(config.request_delay_ms, DEFAULT_REQUEST_DELAY_MS);
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("embeddings.toml");
        tokio::fs::write(&path, "request_delay_ms = 5\ncredentials_path = \"/tmp/keys.json\"\n")
            .await
            .unwrap();

        let config = ServiceConfig::load(&path).await.unwrap();
        assert_eq!(config.request_delay_ms, 5);
        assert_eq!(
            config.resolved_credentials_path(),
            Some(PathBuf::from("/tmp/keys.json"))
        );
    }
}
