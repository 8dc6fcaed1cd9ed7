//! Vector index abstraction for document chunks.
//!
//! Defines a trait for provider-agnostic vector retrieval.

use crate::types::{IndexStats, ScoredChunk};
use docchat_core::AppResult;

/// Trait for vector index backends.
///
/// Indexes are built once and are read-only afterwards, so implementations
/// must be safe to share across request handlers.
pub trait VectorIndex: Send + Sync {
    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns at most `top_k` chunks ordered by descending similarity score;
    /// equal scores keep ingestion order.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>>;

    /// Get statistics about the index.
    fn stats(&self) -> IndexStats;

    /// Number of indexed chunks.
    fn len(&self) -> usize {
        self.stats().chunks
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
