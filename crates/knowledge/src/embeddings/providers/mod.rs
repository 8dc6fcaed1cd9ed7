//! Embedding provider implementations.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiEmbeddingProvider;
pub use mock::MockProvider;
