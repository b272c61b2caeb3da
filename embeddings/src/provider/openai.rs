//! OpenAI embeddings adapter.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EmbeddingProvider, ensure_success, malformed_response, network_error, parse_body};
use crate::Embedding;
use crate::config::DEFAULT_OPENAI_BASE_URL;
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::registry::{ProviderDescriptor, ProviderFamily};

/// OpenAI embedding provider.
///
/// Sends every text of a batch in a single request.
pub struct OpenAIProvider {
    /// Shared API keys.
    credentials: Arc<CredentialStore>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider.
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
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

    async fn request(
        &self,
        texts: &[&str],
        descriptor: &ProviderDescriptor,
    ) -> Result<Vec<Embedding>> {
        let api_key = self.credentials.require(descriptor).await?;
        let provider = descriptor.name;

        debug!(
            "Requesting {} embeddings with model: {}",
            texts.len(),
            descriptor.model
        );

        let body = OpenAIEmbeddingRequest {
            input: texts,
            model: descriptor.model,
            encoding_format: "float",
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(provider, e))?;

        let response = ensure_success(provider, response).await?;
        let result: OpenAIEmbeddingResponse = parse_body(provider, response).await?;

        if result.data.len() != texts.len() {
            return Err(malformed_response(
                provider,
                format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    result.data.len()
                ),
            ));
        }

        // The API returns items in input order.
        Ok(result.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::OpenAi
    }

    async fn embed_batch(
        &self,
        texts: &[&str],
        descriptor: &ProviderDescriptor,
    ) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            self.credentials.require(descriptor).await?;
            return Ok(Vec::new());
        }
        self.request(texts, descriptor).await
    }

    async fn embed_one(&self, text: &str, descriptor: &ProviderDescriptor) -> Result<Embedding> {
        self.request(&[text], descriptor)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| malformed_response(descriptor.name, "no embedding in response"))
    }
}

#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    input: &'a [&'a str],
    model: &'a str,
    encoding_format: &'a str,
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}
