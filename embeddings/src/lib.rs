//! # Embeddings
//!
//! Batched embedding generation for indexed text chunks.
//!
//! ## Features
//!
//! - **Provider Registry**: fixed model, dimensionality and price per provider key
//! - **Multiple Providers**: OpenAI (batch-native) and Gemini (one text per request)
//! - **Failure Isolation**: a failed batch yields zero vectors, never a short result
//! - **Vector Utilities**: cosine similarity, embedding validation, cost estimates
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embedding Pipeline                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Chunks ──► EmbeddingService ──► EmbeddingProvider ──► HTTP     │
//! │                  │        │              │                      │
//! │                  ▼        ▼              ▼                      │
//! │          IndexingStats  CredentialStore  OpenAI / Gemini        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gemcraft_embeddings::{EmbeddingService, ServiceConfig};
//!
//! let service = EmbeddingService::from_config(ServiceConfig::from_env()).await?;
//! let run = service.generate_embeddings(&chunks, "openai-3-small").await?;
//! assert_eq!(run.embeddings.len(), chunks.len());
//! ```

pub mod chunk;
pub mod config;
pub mod cost;
pub mod credentials;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod similarity;

pub use chunk::{Chunk, ChunkMetadata};
pub use config::ServiceConfig;
pub use cost::{CostEstimate, estimate_cost};
pub use credentials::CredentialStore;
pub use diagnostics::ConnectionStatus;
pub use error::{EmbeddingError, Result};
pub use pipeline::{EmbeddingRun, EmbeddingService, IndexingStats};
pub use provider::{EmbeddingProvider, GeminiProvider, OpenAIProvider};
pub use registry::{ProviderDescriptor, ProviderFamily, ProviderKind, lookup};
pub use similarity::{
    EmbeddingValidation, cosine_similarity, validate_embedding, validate_embedding_value,
};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
