//! Up-front price quotes for an indexing run.

use serde::Serialize;

use crate::chunk::{Chunk, total_tokens};
use crate::error::Result;
use crate::registry::{self, ProviderDescriptor};

/// Price quote for embedding a set of chunks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub total_tokens: u64,
    pub cost_estimate: f64,
    pub descriptor: &'static ProviderDescriptor,
}

/// Estimate what [`generate_embeddings`] would cost for `chunks`, using the
/// same formula the run itself reports. No request is made.
///
/// [`generate_embeddings`]: crate::EmbeddingService::generate_embeddings
pub fn estimate_cost(chunks: &[Chunk], provider_key: &str) -> Result<CostEstimate> {
    let descriptor = registry::lookup(provider_key)?;
    let total_tokens = total_tokens(chunks);

    Ok(CostEstimate {
        total_tokens,
        cost_estimate: descriptor.cost_for(total_tokens),
        descriptor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use pretty_assertions::assert_eq;

    fn chunks_with_tokens(tokens: &[u64]) -> Vec<Chunk> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(format!("chunk {i}"), *t))
            .collect()
    }

    #[test]
    fn test_estimate_sums_tokens() {
        let estimate = estimate_cost(&chunks_with_tokens(&[400, 600]), "openai-3-large").unwrap();
        assert_eq!(estimate.total_tokens, 1000);
        assert!((estimate.cost_estimate - 0.00013).abs() < 1e-12);
        assert_eq!(estimate.descriptor.model, "text-embedding-3-large");
    }

    #[test]
    fn test_estimate_is_linear_in_tokens() {
        let single = estimate_cost(&chunks_with_tokens(&[120, 80, 300]), "openai-3-small").unwrap();
        let double = estimate_cost(&chunks_with_tokens(&[240, 160, 600]), "openai-3-small").unwrap();

        assert_eq!(double.total_tokens, single.total_tokens * 2);
        assert!((double.cost_estimate - single.cost_estimate * 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_empty() {
        let estimate = estimate_cost(&[], "gemini-embedding-004").unwrap();
        assert_eq!(estimate.total_tokens, 0);
        assert_eq!(estimate.cost_estimate, 0.0);
    }

    #[test]
    fn test_estimate_unknown_provider() {
        assert!(matches!(
            estimate_cost(&[], "unknown"),
            Err(EmbeddingError::UnknownProviderKind(_))
        ));
    }
}
