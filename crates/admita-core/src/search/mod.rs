//! Retrieval over the vector store
//!
//! Nearest-neighbor search with optional track filtering and deterministic
//! ordering.

mod retriever;

pub use retriever::Retriever;

use crate::db::StoredChunk;

/// One retrieved passage with its similarity score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: StoredChunk,
    pub score: f32,
}

/// Ordered retrieval output, descending by score, length <= k.
/// Computed per query, never persisted.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub passages: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }
}
