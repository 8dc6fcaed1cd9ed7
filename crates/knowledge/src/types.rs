//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A markdown document read from the corpus directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path the text was read from
    pub source_path: PathBuf,

    /// Raw file contents
    pub text: String,
}

impl Document {
    pub fn new(source_path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            text: text.into(),
        }
    }
}

/// A chunk produced by the chunker, before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCandidate {
    /// Position of this chunk within its document
    pub position: u32,

    /// Chunk text, exactly as it appears in the document
    pub text: String,

    /// Byte range of the chunk within the document
    pub byte_range: (usize, usize),
}

/// An embedded chunk owned by the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Ingestion ordinal, unique across the index
    pub id: usize,

    /// Source document path
    pub source_path: PathBuf,

    /// Position within the source document
    pub position: u32,

    /// Chunk text
    pub text: String,

    /// Byte range within the source document
    pub byte_range: (usize, usize),

    /// Embedding vector
    pub vector: Vec<f32>,
}

/// A search hit: a chunk and its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: usize,
    pub source_path: PathBuf,
    pub text: String,
    pub score: f32,
}

/// Statistics about a built index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Distinct source documents
    pub documents: usize,

    /// Indexed chunks
    pub chunks: usize,

    /// Vector dimension
    pub dimensions: usize,
}

/// Statistics from an indexing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingStats {
    /// Documents that produced chunks
    pub documents_indexed: usize,

    /// Documents skipped because they had no text
    pub documents_skipped: usize,

    /// Chunks embedded and indexed
    pub chunks_count: usize,

    /// Bytes of document text processed
    pub bytes_processed: u64,

    /// Wall-clock duration
    pub duration_secs: f64,
}
