//! Static catalog of supported embedding providers.
//!
//! Every other component reads dimensionality and pricing from here; nothing
//! else hardcodes them.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::{EmbeddingError, Result};

/// A provider family. Each family has one adapter and one API key.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderFamily {
    /// OpenAI embeddings API, accepts many inputs per request.
    OpenAi,
    /// Google Gemini `embedContent`, one input per request.
    Gemini,
}

impl ProviderFamily {
    /// Order in which families are tried when the caller does not pick one.
    pub const PREFERENCE: [ProviderFamily; 2] = [ProviderFamily::Gemini, ProviderFamily::OpenAi];

    /// Environment variable holding this family's API key.
    pub fn env_var(self) -> &'static str {
        match self {
            ProviderFamily::OpenAi => "OPENAI_API_KEY",
            ProviderFamily::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Provider used for this family when no key is given.
    pub fn default_kind(self) -> ProviderKind {
        match self {
            ProviderFamily::OpenAi => ProviderKind::OpenAi3Small,
            ProviderFamily::Gemini => ProviderKind::GeminiEmbedding004,
        }
    }
}

/// Stable registry key of a provider.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "gemini-embedding-004")]
    #[strum(serialize = "gemini-embedding-004")]
    GeminiEmbedding004,

    #[serde(rename = "openai-3-small")]
    #[strum(serialize = "openai-3-small")]
    OpenAi3Small,

    #[serde(rename = "openai-3-large")]
    #[strum(serialize = "openai-3-large")]
    OpenAi3Large,

    #[serde(rename = "openai-ada-002")]
    #[strum(serialize = "openai-ada-002")]
    OpenAiAda002,
}

impl ProviderKind {
    /// The descriptor for this key.
    pub fn descriptor(self) -> &'static ProviderDescriptor {
        match self {
            ProviderKind::GeminiEmbedding004 => &GEMINI_EMBEDDING_004,
            ProviderKind::OpenAi3Small => &OPENAI_3_SMALL,
            ProviderKind::OpenAi3Large => &OPENAI_3_LARGE,
            ProviderKind::OpenAiAda002 => &OPENAI_ADA_002,
        }
    }

    /// All registered descriptors, in declaration order.
    pub fn all() -> impl Iterator<Item = &'static ProviderDescriptor> {
        ProviderKind::iter().map(ProviderKind::descriptor)
    }
}

/// Immutable description of an embedding provider.
#[derive(Debug, PartialEq, Serialize)]
pub struct ProviderDescriptor {
    /// Registry key.
    pub kind: ProviderKind,

    /// Human-readable provider name.
    pub name: &'static str,

    /// Adapter family.
    pub family: ProviderFamily,

    /// Model identifier sent to the provider.
    pub model: &'static str,

    /// Length of every vector this provider returns.
    pub dimensions: usize,

    /// Price in USD per 1000 input tokens.
    pub cost_per_1k_tokens: f64,
}

impl ProviderDescriptor {
    /// Price of embedding `tokens` tokens with this provider.
    pub fn cost_for(&self, tokens: u64) -> f64 {
        (tokens as f64 / 1000.0) * self.cost_per_1k_tokens
    }

    /// An all-zero vector of this provider's dimensionality.
    pub fn zero_vector(&self) -> crate::Embedding {
        vec![0.0; self.dimensions]
    }
}

static GEMINI_EMBEDDING_004: ProviderDescriptor = ProviderDescriptor {
    kind: ProviderKind::GeminiEmbedding004,
    name: "Google Gemini",
    family: ProviderFamily::Gemini,
    model: "text-embedding-004",
    dimensions: 768,
    cost_per_1k_tokens: 0.00001,
};

static OPENAI_3_SMALL: ProviderDescriptor = ProviderDescriptor {
    kind: ProviderKind::OpenAi3Small,
    name: "OpenAI",
    family: ProviderFamily::OpenAi,
    model: "text-embedding-3-small",
    dimensions: 1536,
    cost_per_1k_tokens: 0.00002,
};

static OPENAI_3_LARGE: ProviderDescriptor = ProviderDescriptor {
    kind: ProviderKind::OpenAi3Large,
    name: "OpenAI",
    family: ProviderFamily::OpenAi,
    model: "text-embedding-3-large",
    dimensions: 3072,
    cost_per_1k_tokens: 0.00013,
};

static OPENAI_ADA_002: ProviderDescriptor = ProviderDescriptor {
    kind: ProviderKind::OpenAiAda002,
    name: "OpenAI",
    family: ProviderFamily::OpenAi,
    model: "text-embedding-ada-002",
    dimensions: 1536,
    cost_per_1k_tokens: 0.0001,
};

/// Look up a provider descriptor by its registry key.
pub fn lookup(key: &str) -> Result<&'static ProviderDescriptor> {
    key.parse::<ProviderKind>()
        .map(ProviderKind::descriptor)
        .map_err(|_| EmbeddingError::UnknownProviderKind(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_known_keys() {
        let gemini = lookup("gemini-embedding-004").unwrap();
        assert_eq!(gemini.family, ProviderFamily::Gemini);
        assert_eq!(gemini.model, "text-embedding-004");
        assert_eq!(gemini.dimensions, 768);

        let openai = lookup("openai-3-small").unwrap();
        assert_eq!(openai.family, ProviderFamily::OpenAi);
        assert_eq!(openai.dimensions, 1536);
    }

    #[test]
    fn test_lookup_unknown_key() {
        let err = lookup("cohere-v3").unwrap_err();
        assert!(matches!(err, EmbeddingError::UnknownProviderKind(ref key) if key == "cohere-v3"));
    }

    #[test]
    fn test_every_kind_round_trips_through_its_key() {
        for descriptor in ProviderKind::all() {
            let key = descriptor.kind.to_string();
            assert_eq!(lookup(&key).unwrap(), descriptor);
        }
    }

    #[test]
    fn test_default_kind_is_gemini() {
        assert_eq!(ProviderKind::default().to_string(), "gemini-embedding-004");
    }

    #[test]
    fn test_family_parsing() {
        assert_eq!("openai".parse::<ProviderFamily>().unwrap(), ProviderFamily::OpenAi);
        assert_eq!("Gemini".parse::<ProviderFamily>().unwrap(), ProviderFamily::Gemini);
        assert!("cohere".parse::<ProviderFamily>().is_err());
    }

    #[test]
    fn test_cost_for() {
        let descriptor = ProviderKind::OpenAi3Small.descriptor();
        assert!((descriptor.cost_for(1000) - 0.00002).abs() < 1e-12);
        assert_eq!(descriptor.cost_for(0), 0.0);
    }
}
