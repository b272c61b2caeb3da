//! Connection health check for settings screens.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pipeline::EmbeddingService;
use crate::registry::{self, ProviderFamily};

/// Text embedded by the connection probe.
pub const CONNECTION_PROBE_TEXT: &str = "Connection test";

/// Result of [`EmbeddingService::test_connection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,

    /// Provider name, when one was selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ConnectionStatus {
    fn failed(message: impl Into<String>, provider: Option<&str>) -> Self {
        Self {
            success: false,
            message: message.into(),
            provider: provider.map(str::to_string),
        }
    }
}

impl EmbeddingService {
    /// Embed a short probe text to confirm the provider is reachable and the
    /// key is accepted.
    ///
    /// Without a key, the first configured family in
    /// [`ProviderFamily::PREFERENCE`] is probed. Every failure is reported in
    /// the returned status; this never returns an error. Nothing is sent when
    /// the chosen provider has no credentials.
    pub async fn test_connection(&self, provider_key: Option<&str>) -> ConnectionStatus {
        let descriptor = match provider_key {
            Some(key) => match registry::lookup(key) {
                Ok(descriptor) => descriptor,
                Err(e) => return ConnectionStatus::failed(e.to_string(), None),
            },
            None => match self
                .credentials()
                .first_configured(&ProviderFamily::PREFERENCE)
                .await
            {
                Some(family) => family.default_kind().descriptor(),
                None => return ConnectionStatus::failed("no API key configured", None),
            },
        };

        let provider = descriptor.name;
        if !self.credentials().has_key(descriptor.family).await {
            return ConnectionStatus::failed(
                format!("{provider} API key missing"),
                Some(provider),
            );
        }

        let key = descriptor.kind.to_string();
        match self
            .generate_single_embedding(CONNECTION_PROBE_TEXT, &key)
            .await
        {
            Ok(_) => {
                info!("Connection to {provider} succeeded");
                ConnectionStatus {
                    success: true,
                    message: format!("Connected to the {provider} API"),
                    provider: Some(provider.to_string()),
                }
            }
            Err(e) => {
                warn!("Connection to {provider} failed: {e}");
                ConnectionStatus::failed(e.to_string(), Some(provider))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ServiceConfig;
    use crate::credentials::CredentialStore;
    use pretty_assertions::assert_eq;

    fn service(credentials: CredentialStore) -> EmbeddingService {
        // Unroutable base URLs: any request attempt fails.
        let config = ServiceConfig::default()
            .with_openai_base_url("http://127.0.0.1:9")
            .with_gemini_base_url("http://127.0.0.1:9");
        EmbeddingService::new(config, Arc::new(credentials)).unwrap()
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let status = service(CredentialStore::in_memory()).test_connection(None).await;
        assert_eq!(
            status,
            ConnectionStatus {
                success: false,
                message: "no API key configured".to_string(),
                provider: None
            }
        );
    }

    #[tokio::test]
    async fn test_requested_provider_without_key() {
        let credentials = CredentialStore::in_memory().with_key(ProviderFamily::Gemini, "g");
        let status = service(credentials)
            .test_connection(Some("openai-3-small"))
            .await;

        assert!(!status.success);
        assert_eq!(status.message, "OpenAI API key missing");
        assert_eq!(status.provider.as_deref(), Some("OpenAI"));
    }

    #[tokio::test]
    async fn test_unknown_provider_key() {
        let status = service(CredentialStore::in_memory())
            .test_connection(Some("mystery"))
            .await;
        assert!(!status.success);
        assert_eq!(status.message, "unknown embedding provider: mystery");
    }

    #[tokio::test]
    async fn test_request_failure_is_reported() {
        let credentials = CredentialStore::in_memory().with_key(ProviderFamily::OpenAi, "sk");
        let status = service(credentials).test_connection(None).await;

        assert!(!status.success);
        assert_eq!(status.provider.as_deref(), Some("OpenAI"));
        assert!(status.message.contains("network"), "{}", status.message);
    }
}
