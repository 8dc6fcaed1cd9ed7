//! Text chunking with configurable size and overlap.
//!
//! Sizes and overlaps are counted in characters (Unicode scalar values).
//! Consecutive chunks share exactly `overlap` characters, so dropping the
//! first `overlap` characters of every chunk after the first and
//! concatenating reproduces the input.

use crate::types::ChunkCandidate;
use docchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Split-point separators, most preferred tier first.
///
/// Within a tier the latest occurrence in the window wins.
const SEPARATOR_TIERS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "? ", "! "], &[" "]];

/// Chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub overlap: usize,
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        let config = Self {
            chunk_size,
            overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// Chunk text into overlapping segments.
///
/// # Errors
/// * `AppError::Config` - invalid size/overlap combination
/// * `AppError::EmptyDocument` - text is empty or whitespace only
pub fn chunk_text(text: &str, config: &ChunkConfig) -> AppResult<Vec<ChunkCandidate>> {
    config.validate()?;

    if text.trim().is_empty() {
        return Err(AppError::EmptyDocument(
            "Document contains no text".to_string(),
        ));
    }

    let chars: Vec<char> = text.chars().collect();
    // Byte offset of every char, plus the end of the text
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    let n = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut position = 0u32;

    loop {
        let hard_end = (start + config.chunk_size).min(n);
        let end = if hard_end == n {
            n
        } else {
            // Split points in the first half of the window are ignored so
            // chunks stay reasonably full; the next start must move forward.
            let min_end = start + (config.overlap + 1).max(config.chunk_size / 2);
            find_split(&chars, min_end, hard_end).unwrap_or(hard_end)
        };

        chunks.push(ChunkCandidate {
            position,
            text: text[offsets[start]..offsets[end]].to_string(),
            byte_range: (offsets[start], offsets[end]),
        });
        position += 1;

        if end == n {
            break;
        }
        start = end - config.overlap;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        config.chunk_size,
        config.overlap
    );

    Ok(chunks)
}

/// Convenience wrapper returning only the chunk strings.
pub fn split_text(text: &str, config: &ChunkConfig) -> AppResult<Vec<String>> {
    Ok(chunk_text(text, config)?
        .into_iter()
        .map(|c| c.text)
        .collect())
}

/// Latest end position in `[min_end, max_end]` that directly follows a
/// separator, trying separator tiers in order of preference.
fn find_split(chars: &[char], min_end: usize, max_end: usize) -> Option<usize> {
    if min_end > max_end {
        return None;
    }

    for tier in SEPARATOR_TIERS {
        for end in (min_end..=max_end).rev() {
            if tier.iter().any(|sep| ends_with(chars, end, sep)) {
                return Some(end);
            }
        }
    }
    None
}

fn ends_with(chars: &[char], end: usize, sep: &str) -> bool {
    let len = sep.chars().count();
    end >= len && chars[end - len..end].iter().copied().eq(sep.chars())
}
