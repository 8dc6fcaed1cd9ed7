//! Embedding providers.
//!
//! Provider-agnostic embedding generation for corpus chunks and queries.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
