//! In-memory flat vector index with exact cosine search.

use crate::types::{DocumentChunk, IndexStats, ScoredChunk};
use crate::vector_index::VectorIndex;
use docchat_core::{AppError, AppResult};
use std::collections::HashSet;

/// Exact nearest-neighbour index over unit-normalised vectors.
#[derive(Debug)]
pub struct InMemoryIndex {
    chunks: Vec<DocumentChunk>,
    /// Unit-length copies of the chunk vectors (zero vectors stay zero)
    normalized: Vec<Vec<f32>>,
    dimensions: usize,
    documents: usize,
}

impl InMemoryIndex {
    /// Build an index from embedded chunks.
    ///
    /// Chunk ids are reassigned to their ingestion ordinal.
    ///
    /// # Errors
    /// * `AppError::EmptyCorpus` - no chunks
    /// * `AppError::Knowledge` - vectors of inconsistent or zero dimension
    pub fn build(chunks: Vec<DocumentChunk>) -> AppResult<Self> {
        let dimensions = match chunks.first() {
            Some(first) => first.vector.len(),
            None => {
                return Err(AppError::EmptyCorpus(
                    "No document chunks to index".to_string(),
                ))
            }
        };

        if dimensions == 0 {
            return Err(AppError::Knowledge(
                "Embedding vectors must not be empty".to_string(),
            ));
        }

        let mut chunks = chunks;
        let mut normalized = Vec::with_capacity(chunks.len());
        let mut sources = HashSet::new();

        for (id, chunk) in chunks.iter_mut().enumerate() {
            if chunk.vector.len() != dimensions {
                return Err(AppError::Knowledge(format!(
                    "Chunk {} from {:?} has dimension {}, expected {}",
                    id,
                    chunk.source_path,
                    chunk.vector.len(),
                    dimensions
                )));
            }
            chunk.id = id;
            sources.insert(chunk.source_path.clone());
            normalized.push(normalize(&chunk.vector));
        }

        tracing::info!(
            "Built vector index: {} chunks from {} documents, dimension {}",
            chunks.len(),
            sources.len(),
            dimensions
        );

        Ok(Self {
            documents: sources.len(),
            chunks,
            normalized,
            dimensions,
        })
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }
}

impl VectorIndex for InMemoryIndex {
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        if query_embedding.len() != self.dimensions {
            return Err(AppError::Knowledge(format!(
                "Query has dimension {}, index expects {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let query = normalize(query_embedding);
        let mut scored: Vec<(usize, f32)> = self
            .normalized
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(&query, v)))
            .collect();

        // Stable sort keeps ingestion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let chunk = &self.chunks[i];
                ScoredChunk {
                    id: chunk.id,
                    source_path: chunk.source_path.clone(),
                    text: chunk.text.clone(),
                    score,
                }
            })
            .collect())
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.documents,
            chunks: self.chunks.len(),
            dimensions: self.dimensions,
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = dot(v, v).sqrt();
    if norm > 0.0 && norm.is_finite() {
        v.iter().map(|x| x / norm).collect()
    } else {
        vec![0.0; v.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn chunk(source: &str, text: &str, vector: Vec<f32>) -> DocumentChunk {
        DocumentChunk {
            id: usize::MAX,
            source_path: PathBuf::from(source),
            position: 0,
            text: text.to_string(),
            byte_range: (0, text.len()),
            vector,
        }
    }

    fn sample_index() -> InMemoryIndex {
        InMemoryIndex::build(vec![
            chunk("a.md", "satu", vec![1.0, 0.0, 0.0]),
            chunk("a.md", "dua", vec![0.0, 1.0, 0.0]),
            chunk("b.md", "tiga", vec![0.7, 0.7, 0.0]),
            chunk("c.md", "empat", vec![0.0, 0.0, 2.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_build_is_empty_corpus() {
        assert!(matches!(
            InMemoryIndex::build(Vec::new()),
            Err(AppError::EmptyCorpus(_))
        ));
    }

    #[test]
    fn test_inconsistent_dimensions_rejected() {
        let result = InMemoryIndex::build(vec![
            chunk("a.md", "satu", vec![1.0, 0.0]),
            chunk("a.md", "dua", vec![1.0, 0.0, 0.0]),
        ]);
        assert!(matches!(result, Err(AppError::Knowledge(_))));
    }

    #[test]
    fn test_ids_and_stats() {
        let index = sample_index();
        let ids: Vec<usize> = index.chunks().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(
            index.stats(),
            IndexStats {
                documents: 3,
                chunks: 4,
                dimensions: 3
            }
        );
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_identical_vector_ranks_first() {
        let index = sample_index();
        let hits = index.search(&[0.0, 0.0, 5.0], 4).unwrap();
        assert_eq!(hits[0].text, "empat");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_returns_min_k_n_sorted_descending() {
        let index = sample_index();

        let hits = index.search(&[1.0, 0.2, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);

        let hits = index.search(&[1.0, 0.2, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 4);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_ties_keep_ingestion_order() {
        let index = InMemoryIndex::build(vec![
            chunk("a.md", "pertama", vec![0.0, 1.0]),
            chunk("a.md", "kedua", vec![0.0, 3.0]),
            chunk("a.md", "ketiga", vec![1.0, 0.0]),
        ])
        .unwrap();

        let hits = index.search(&[0.0, 1.0], 3).unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["pertama", "kedua", "ketiga"]);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[1.0, 0.0], 4),
            Err(AppError::Knowledge(_))
        ));
    }

    #[test]
    fn test_zero_vectors_score_zero() {
        let index = InMemoryIndex::build(vec![chunk("a.md", "kosong", vec![0.0, 0.0])]).unwrap();
        let hits = index.search(&[1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].score, 0.0);
    }
}
