//! Batch orchestration.
//!
//! `EmbeddingService` is the entry point for callers. It is built once per
//! process around a shared [`CredentialStore`] and routes each request to the
//! adapter registered for the provider's family.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::Embedding;
use crate::chunk::{Chunk, total_tokens};
use crate::config::ServiceConfig;
use crate::credentials::CredentialStore;
use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, GeminiProvider, OpenAIProvider, malformed_response};
use crate::registry::{self, ProviderDescriptor, ProviderFamily};

/// Statistics for one `generate_embeddings` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingStats {
    pub total_chunks: usize,
    pub total_embeddings: usize,

    /// Tokens of the batches that succeeded.
    pub total_tokens: u64,
    pub processing_time_ms: u64,

    /// USD, for the tokens in `total_tokens`.
    pub cost_estimate: f64,

    /// One message per failed batch, in batch order.
    pub errors: Vec<String>,
}

/// Vectors and statistics returned by `generate_embeddings`.
///
/// `embeddings[i]` belongs to the i-th input chunk. Chunks of a failed batch
/// get all-zero vectors; `stats.errors` says which batches those were.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRun {
    pub embeddings: Vec<Embedding>,
    pub stats: IndexingStats,
}

/// Embedding generation service.
pub struct EmbeddingService {
    /// Configuration.
    config: ServiceConfig,

    /// API keys shared with the adapters.
    credentials: Arc<CredentialStore>,

    /// One adapter per provider family.
    providers: HashMap<ProviderFamily, Arc<dyn EmbeddingProvider>>,
}

impl EmbeddingService {
    /// Create a service with the built-in OpenAI and Gemini adapters.
    pub fn new(config: ServiceConfig, credentials: Arc<CredentialStore>) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::new();
        let openai = OpenAIProvider::new(Arc::clone(&credentials))
            .with_base_url(config.openai_base_url.clone())
            .with_client(client.clone());
        let gemini = GeminiProvider::new(Arc::clone(&credentials))
            .with_base_url(config.gemini_base_url.clone())
            .with_client(client)
            .with_request_delay(config.request_delay());

        let service = Self {
            config,
            credentials,
            providers: HashMap::new(),
        };

        Ok(service
            .with_provider(Arc::new(openai))
            .with_provider(Arc::new(gemini)))
    }

    /// Create a service whose credentials are loaded from the environment and
    /// the configured credentials file.
    pub async fn from_config(config: ServiceConfig) -> Result<Self> {
        let credentials = match config.resolved_credentials_path() {
            Some(path) => CredentialStore::load(path).await?,
            None => CredentialStore::in_memory(),
        };
        Self::new(config, Arc::new(credentials))
    }

    /// Register an adapter, replacing any existing one for its family.
    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.providers.insert(provider.family(), provider);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Set and persist the API key for a family.
    pub async fn configure(&self, family: ProviderFamily, api_key: impl Into<String>) -> Result<()> {
        self.credentials.configure(family, api_key).await
    }

    /// Whether the provider behind a registry key has credentials.
    pub async fn is_provider_configured(&self, provider_key: &str) -> Result<bool> {
        self.credentials.is_configured(provider_key).await
    }

    /// Whether any provider has credentials.
    pub async fn is_configured(&self) -> bool {
        self.credentials.is_any_configured().await
    }

    /// Descriptor and adapter for a registry key, after checking credentials.
    pub(crate) async fn resolve(
        &self,
        provider_key: &str,
    ) -> Result<(&'static ProviderDescriptor, Arc<dyn EmbeddingProvider>)> {
        let descriptor = registry::lookup(provider_key)?;

        if !self.credentials.has_key(descriptor.family).await {
            return Err(EmbeddingError::ProviderUnconfigured {
                provider: descriptor.name.to_string(),
            });
        }

        let provider = self.providers.get(&descriptor.family).cloned().ok_or_else(|| {
            EmbeddingError::Config(format!("no adapter registered for {}", descriptor.family))
        })?;

        Ok((descriptor, provider))
    }

    /// Embed every chunk, batch by batch.
    ///
    /// Only lookup and credential problems fail the call. A failed batch is
    /// recorded in `stats.errors` and padded with zero vectors, so the result
    /// always has exactly one vector per chunk.
    pub async fn generate_embeddings(
        &self,
        chunks: &[Chunk],
        provider_key: &str,
    ) -> Result<EmbeddingRun> {
        let (descriptor, provider) = self.resolve(provider_key).await?;

        let started = Instant::now();
        let batch_size = self.config.batch_size;
        let batch_count = chunks.len().div_ceil(batch_size);
        let mut embeddings: Vec<Embedding> = Vec::with_capacity(chunks.len());
        let mut errors = Vec::new();
        let mut tokens = 0u64;

        info!(
            "Generating embeddings for {} chunks with {}",
            chunks.len(),
            descriptor.model
        );

        for (index, batch) in chunks.chunks(batch_size).enumerate() {
            let batch_number = index + 1;
            let texts: Vec<&str> = batch.iter().map(|chunk| chunk.content.as_str()).collect();

            let result = provider
                .embed_batch(&texts, descriptor)
                .await
                .and_then(|vectors| check_batch(descriptor, vectors, batch.len()));

            match result {
                Ok(vectors) => {
                    embeddings.extend(vectors);
                    tokens = tokens.saturating_add(total_tokens(batch));
                    info!("Batch {batch_number}/{batch_count} processed");
                }
                Err(e) => {
                    let message = format!("batch {batch_number} failed: {e}");
                    error!("{message}");
                    errors.push(message);
                    embeddings.extend((0..batch.len()).map(|_| descriptor.zero_vector()));
                }
            }

            if batch_number < batch_count {
                tokio::time::sleep(self.config.batch_delay()).await;
            }
        }

        let stats = IndexingStats {
            total_chunks: chunks.len(),
            total_embeddings: embeddings.len(),
            total_tokens: tokens,
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            cost_estimate: descriptor.cost_for(tokens),
            errors,
        };

        info!(
            "Indexing finished: {} embeddings, {} tokens, {} failed batches, {}ms, ${:.6}",
            stats.total_embeddings,
            stats.total_tokens,
            stats.errors.len(),
            stats.processing_time_ms,
            stats.cost_estimate
        );

        Ok(EmbeddingRun { embeddings, stats })
    }

    /// Embed a single text, typically a search query.
    pub async fn generate_single_embedding(
        &self,
        text: &str,
        provider_key: &str,
    ) -> Result<Embedding> {
        let (descriptor, provider) = self.resolve(provider_key).await?;
        debug!("Generating query embedding with {}", descriptor.model);
        let vector = provider.embed_one(text, descriptor).await?;
        check_dimensions(descriptor, &vector)?;
        Ok(vector)
    }
}

/// An adapter that returns the wrong number of vectors would shift every
/// later chunk, so it counts as a failed batch. So does any vector of the
/// wrong length.
fn check_batch(
    descriptor: &ProviderDescriptor,
    vectors: Vec<Embedding>,
    expected: usize,
) -> Result<Vec<Embedding>> {
    if vectors.len() != expected {
        return Err(malformed_response(
            descriptor.name,
            format!("expected {expected} embeddings, got {}", vectors.len()),
        ));
    }
    for vector in &vectors {
        check_dimensions(descriptor, vector)?;
    }
    Ok(vectors)
}

fn check_dimensions(descriptor: &ProviderDescriptor, vector: &[f32]) -> Result<()> {
    if vector.len() != descriptor.dimensions {
        return Err(malformed_response(
            descriptor.name,
            format!(
                "expected {} dimensions, got {}",
                descriptor.dimensions,
                vector.len()
            ),
        ));
    }
    Ok(())
}
