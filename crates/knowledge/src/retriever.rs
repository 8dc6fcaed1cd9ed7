//! Query-time retrieval: embed the question, search the index.

use crate::embeddings::EmbeddingProvider;
use crate::types::ScoredChunk;
use crate::vector_index::VectorIndex;
use docchat_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 4;

/// Retrieval options.
#[derive(Debug, Clone, Copy)]
pub struct RetrieverOptions {
    pub top_k: usize,
    /// Drop hits scoring below this cosine similarity
    pub min_score: Option<f32>,
    /// Time budget for embedding the query
    pub timeout: Duration,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Wraps an embedding provider and a read-only vector index.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    options: RetrieverOptions,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        options: RetrieverOptions,
    ) -> Self {
        Self {
            embedder,
            index,
            options,
        }
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn options(&self) -> &RetrieverOptions {
        &self.options
    }

    /// Chunk texts most relevant to `query`, best first.
    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<String>> {
        Ok(self
            .retrieve_scored(query)
            .await?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    /// Like [`Retriever::retrieve`] but keeps scores and sources.
    #[instrument(skip(self, query), fields(query_len = query.len(), top_k = self.options.top_k))]
    pub async fn retrieve_scored(&self, query: &str) -> AppResult<Vec<ScoredChunk>> {
        let timeout = self.options.timeout;
        let embedding = tokio::time::timeout(timeout, self.embedder.embed(query))
            .await
            .map_err(|_| AppError::Timeout {
                operation: "Query embedding".to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })??;

        let mut hits = self.index.search(&embedding, self.options.top_k)?;

        if let Some(min_score) = self.options.min_score {
            hits.retain(|hit| hit.score >= min_score);
        }

        for hit in &hits {
            debug!(score = hit.score, source = ?hit.source_path, "Retrieved chunk {}", hit.id);
        }

        Ok(hits)
    }
}
