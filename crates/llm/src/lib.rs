//! LLM integration crate for docchat.
//!
//! This crate provides a provider-agnostic abstraction for generating answers
//! with Large Language Models, plus the HTTP plumbing shared by every call to
//! the Google Generative Language API.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default)
//! - **Mock**: Deterministic offline client for development and tests
//!
//! # Example
//! ```no_run
//! use docchat_llm::{LlmClient, LlmRequest, providers::{GeminiClient, GeminiSettings}};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new(GeminiSettings::new("api-key"))?;
//! let request = LlmRequest::new("Halo!", "gemini-2.0-flash");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod retry;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, GeminiSettings, GeminiTransport, MockLlmClient};
pub use retry::{with_retries, CallError, RetryPolicy};
