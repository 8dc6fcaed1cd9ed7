//! Generation provider implementations.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiClient, GeminiSettings, GeminiTransport};
pub use mock::MockLlmClient;
