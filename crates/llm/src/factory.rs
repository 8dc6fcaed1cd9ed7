//! LLM provider factory.
//!
//! This module creates the generation client named in the configuration and
//! injects the credential it needs.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, GeminiSettings, MockLlmClient};
use docchat_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "mock")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by "gemini")
/// * `timeout` - Per-request HTTP timeout
/// * `max_retries` - Retries for rate limiting and server errors
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or its credential is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
    max_retries: u32,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "gemini" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Gemini provider requires API key".to_string())
            })?;
            let settings = GeminiSettings::new(api_key)
                .with_base_url(endpoint)
                .with_timeout(timeout)
                .with_max_retries(max_retries);
            Ok(Arc::new(GeminiClient::new(settings)?))
        }
        "mock" => Ok(Arc::new(MockLlmClient::new())),
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}
