//! Gemini `embedContent` adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EmbeddingProvider, ensure_success, network_error, parse_body};
use crate::Embedding;
use crate::config::{DEFAULT_GEMINI_BASE_URL, DEFAULT_REQUEST_DELAY_MS};
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::registry::{ProviderDescriptor, ProviderFamily};

/// Header carrying the API key. Keeps the key out of request URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini embedding provider.
///
/// The endpoint takes one text per call, so batches become a paced sequence
/// of requests.
pub struct GeminiProvider {
    /// Shared API keys.
    credentials: Arc<CredentialStore>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Pause between consecutive requests of one batch.
    request_delay: Duration,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
        }
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Share an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the pause between requests.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    async fn embed_content(
        &self,
        api_key: &str,
        text: &str,
        descriptor: &ProviderDescriptor,
    ) -> Result<Embedding> {
        let provider = descriptor.name;
        let body = GeminiEmbedRequest {
            model: format!("models/{}", descriptor.model),
            content: GeminiContent {
                parts: vec![GeminiPart { text }],
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:embedContent",
                self.base_url, descriptor.model
            ))
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(provider, e))?;

        let response = ensure_success(provider, response).await?;
        let result: GeminiEmbedResponse = parse_body(provider, response).await?;
        Ok(result.embedding.values)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Gemini
    }

    async fn embed_batch(
        &self,
        texts: &[&str],
        descriptor: &ProviderDescriptor,
    ) -> Result<Vec<Embedding>> {
        let api_key = self.credentials.require(descriptor).await?;

        debug!(
            "Requesting {} embeddings one at a time with model: {}",
            texts.len(),
            descriptor.model
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            embeddings.push(self.embed_content(&api_key, text, descriptor).await?);
        }

        Ok(embeddings)
    }

    async fn embed_one(&self, text: &str, descriptor: &ProviderDescriptor) -> Result<Embedding> {
        let api_key = self.credentials.require(descriptor).await?;
        self.embed_content(&api_key, text, descriptor).await
    }
}

#[derive(Debug, Serialize)]
struct GeminiEmbedRequest<'a> {
    model: String,
    content: GeminiContent<'a>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiEmbedding,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body_shape() {
        let body = GeminiEmbedRequest {
            model: "models/text-embedding-004".to_string(),
            content: GeminiContent {
                parts: vec![GeminiPart { text: "hello" }],
            },
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "model": "models/text-embedding-004",
                "content": {"parts": [{"text": "hello"}]}
            })
        );
    }

    #[test]
    fn test_response_missing_values_is_rejected() {
        assert!(serde_json::from_str::<GeminiEmbedResponse>(r#"{"embedding":{}}"#).is_err());
        assert!(serde_json::from_str::<GeminiEmbedResponse>(r#"{}"#).is_err());
    }
}
