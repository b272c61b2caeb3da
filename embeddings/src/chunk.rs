//! Pre-chunked input text.

use serde::{Deserialize, Serialize};

/// A unit of source text with its token count.
///
/// Chunks are produced by the caller's chunker; the pipeline only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The text to embed.
    pub content: String,

    /// Token count and any caller-defined fields.
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a chunk with the given content and token count.
    pub fn new(content: impl Into<String>, tokens: u64) -> Self {
        Self {
            content: content.into(),
            metadata: ChunkMetadata {
                tokens,
                extra: serde_json::Map::new(),
            },
        }
    }

    /// Token count of this chunk.
    pub fn tokens(&self) -> u64 {
        self.metadata.tokens
    }
}

/// Metadata attached to a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Number of tokens in the chunk content.
    pub tokens: u64,

    /// Fields the pipeline does not interpret, kept for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Sum the token counts of a sequence of chunks, saturating at `u64::MAX`.
pub fn total_tokens(chunks: &[Chunk]) -> u64 {
    chunks
        .iter()
        .fold(0u64, |total, chunk| total.saturating_add(chunk.tokens()))
}
