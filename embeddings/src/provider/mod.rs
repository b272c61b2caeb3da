//! Embedding providers.
//!
//! One adapter per provider family. The service only talks to the
//! [`EmbeddingProvider`] trait, so a new provider is a new adapter plus a
//! registry entry.

mod gemini;
mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::registry::{ProviderDescriptor, ProviderFamily};

pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

/// Fallback when a provider's error body carries no readable message.
const UNKNOWN_ERROR: &str = "unknown error";

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The family this adapter serves.
    fn family(&self) -> ProviderFamily;

    /// Embed `texts`, returning one vector per text in input order.
    ///
    /// Fails with `ProviderUnconfigured` before any request when the family
    /// has no API key.
    async fn embed_batch(
        &self,
        texts: &[&str],
        descriptor: &ProviderDescriptor,
    ) -> Result<Vec<Embedding>>;

    /// Embed a single text, using the same request shape as a one-element
    /// batch.
    async fn embed_one(&self, text: &str, descriptor: &ProviderDescriptor) -> Result<Embedding>;
}

/// Pass successful responses through; turn anything else into
/// `ProviderRequestFailed` carrying the provider's own error message.
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body);
    warn!("{provider} API returned {status}: {message}");

    Err(EmbeddingError::request_failed(
        provider,
        status.as_u16().to_string(),
        message,
    ))
}

/// Decode a success body, reporting missing fields as a malformed response.
pub(crate) async fn parse_body<T: DeserializeOwned>(
    provider: &str,
    response: reqwest::Response,
) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| network_error(provider, e))?;

    serde_json::from_slice(&body).map_err(|e| malformed_response(provider, e.to_string()))
}

/// The request URL is stripped from the message; it may carry credentials.
pub(crate) fn network_error(provider: &str, error: reqwest::Error) -> EmbeddingError {
    let error = error.without_url();
    warn!("{provider} request did not complete: {error}");
    EmbeddingError::request_failed(provider, "network", error.to_string())
}

pub(crate) fn malformed_response(provider: &str, message: impl Into<String>) -> EmbeddingError {
    EmbeddingError::request_failed(provider, "invalid response", message)
}

/// Error bodies come as `{"error": {"message": ...}}` or `{"error": "..."}`.
fn extract_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorField,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorField {
        Detailed { message: String },
        Plain(String),
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorField::Detailed { message },
        })
        | Ok(ErrorEnvelope {
            error: ErrorField::Plain(message),
        }) => message,
        Err(_) => UNKNOWN_ERROR.to_string(),
    }
}
