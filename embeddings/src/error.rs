//! Error types for the embeddings pipeline.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings pipeline.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// No API key is stored for the provider's family.
    #[error("{provider} API key not configured")]
    ProviderUnconfigured { provider: String },

    /// The registry has no descriptor for the given key.
    #[error("unknown embedding provider: {0}")]
    UnknownProviderKind(String),

    /// A provider call failed: non-success status, network error or a body
    /// missing the expected fields.
    #[error("{provider} API request failed ({status_or_cause}): {message}")]
    ProviderRequestFailed {
        provider: String,
        status_or_cause: String,
        message: String,
    },

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid service configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Config file could not be parsed.
    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmbeddingError {
    pub(crate) fn request_failed(
        provider: &str,
        status_or_cause: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ProviderRequestFailed {
            provider: provider.to_string(),
            status_or_cause: status_or_cause.into(),
            message: message.into(),
        }
    }
}
