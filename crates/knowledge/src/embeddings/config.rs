//! Embedding configuration.

use serde::{Deserialize, Serialize};

/// Settings used to construct an embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "gemini" or "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions (mock provider only; Gemini reports its own)
    pub dimensions: usize,

    /// Maximum texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Optional custom endpoint
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for rate limiting and server errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_batch_size() -> usize {
    100
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: default_batch_size(),
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl EmbeddingConfig {
    /// Gemini embedding configuration for the given model.
    pub fn gemini(model: impl Into<String>) -> Self {
        Self {
            provider: "gemini".to_string(),
            model: model.into(),
            dimensions: super::providers::gemini::GEMINI_EMBEDDING_DIMENSIONS,
            ..Default::default()
        }
    }
}
