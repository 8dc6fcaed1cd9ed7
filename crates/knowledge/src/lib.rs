//! Document knowledge for docchat.
//!
//! Loads the markdown corpus, splits it into overlapping chunks, embeds the
//! chunks and serves nearest-neighbour retrieval from an in-memory index.

pub mod chunker;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod retriever;
pub mod types;
pub mod vector_index;

// Re-export commonly used types
pub use chunker::{chunk_text, split_text, ChunkConfig};
pub use corpus::load_documents;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::InMemoryIndex;
pub use retriever::{Retriever, RetrieverOptions};
pub use types::{ChunkCandidate, Document, DocumentChunk, IndexStats, IndexingStats, ScoredChunk};
pub use vector_index::VectorIndex;

use docchat_core::{AppError, AppResult};
use futures::{StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::time::Instant;

/// Embedding requests in flight at once while indexing.
const EMBED_CONCURRENCY: usize = 4;

/// Chunk, embed and index a set of documents.
///
/// Documents without text are skipped with a warning. Any embedding failure
/// aborts the run.
///
/// # Errors
/// * `AppError::EmptyCorpus` - no document produced a chunk
/// * `AppError::Config` - invalid chunk settings
/// * `AppError::Provider` / `AppError::Knowledge` - embedding or index failures
pub async fn build_index(
    documents: &[Document],
    chunk_config: &ChunkConfig,
    embedder: &dyn EmbeddingProvider,
    batch_size: usize,
) -> AppResult<(InMemoryIndex, IndexingStats)> {
    let start = Instant::now();
    chunk_config.validate()?;

    tracing::info!(
        "Indexing {} documents with provider '{}' (model: {})",
        documents.len(),
        embedder.provider_name(),
        embedder.model_name()
    );

    let mut pending: Vec<(PathBuf, ChunkCandidate)> = Vec::new();
    let mut documents_indexed = 0usize;
    let mut documents_skipped = 0usize;
    let mut bytes_processed = 0u64;

    for document in documents {
        let candidates = match chunk_text(&document.text, chunk_config) {
            Ok(candidates) => candidates,
            Err(AppError::EmptyDocument(_)) => {
                tracing::warn!("Skipping empty document: {:?}", document.source_path);
                documents_skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(
            "Chunked {:?}: {} chunks",
            document.source_path,
            candidates.len()
        );

        documents_indexed += 1;
        bytes_processed += document.text.len() as u64;
        pending.extend(
            candidates
                .into_iter()
                .map(|candidate| (document.source_path.clone(), candidate)),
        );
    }

    if pending.is_empty() {
        return Err(AppError::EmptyCorpus(format!(
            "No indexable text found in {} documents",
            documents.len()
        )));
    }

    let texts: Vec<String> = pending.iter().map(|(_, c)| c.text.clone()).collect();
    let vectors = embed_in_batches(embedder, &texts, batch_size).await?;

    let chunks: Vec<DocumentChunk> = pending
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(id, ((source_path, candidate), vector))| DocumentChunk {
            id,
            source_path,
            position: candidate.position,
            text: candidate.text,
            byte_range: candidate.byte_range,
            vector,
        })
        .collect();

    let chunks_count = chunks.len();
    let index = InMemoryIndex::build(chunks)?;
    let duration = start.elapsed();

    tracing::info!(
        "Indexing completed: {} documents ({} skipped), {} chunks, {} bytes in {:.2}s",
        documents_indexed,
        documents_skipped,
        chunks_count,
        bytes_processed,
        duration.as_secs_f64()
    );

    Ok((
        index,
        IndexingStats {
            documents_indexed,
            documents_skipped,
            chunks_count,
            bytes_processed,
            duration_secs: duration.as_secs_f64(),
        },
    ))
}

/// Embed texts in order, `batch_size` per request.
async fn embed_in_batches(
    embedder: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> AppResult<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);

    let batches: Vec<Vec<Vec<f32>>> = futures::stream::iter(texts.chunks(batch_size))
        .map(|batch| async move {
            let vectors = embedder.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::Provider(format!(
                    "Embedding provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            Ok(vectors)
        })
        .buffered(EMBED_CONCURRENCY)
        .try_collect()
        .await?;

    Ok(batches.into_iter().flatten().collect())
}
