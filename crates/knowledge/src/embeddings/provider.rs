//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use docchat_core::{AppError, AppResult};
use docchat_llm::GeminiSettings;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "gemini", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple document texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single query text.
    ///
    /// Providers that distinguish query and document embeddings override this.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Provider("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "mock" => {
            let provider = super::providers::MockProvider::new(config.dimensions);
            Ok(Arc::new(provider))
        }

        "gemini" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Gemini embedding provider requires API key".to_string())
            })?;
            let settings = GeminiSettings::new(api_key)
                .with_base_url(config.base_url.as_deref())
                .with_timeout(Duration::from_secs(config.request_timeout_secs))
                .with_max_retries(config.max_retries);
            let provider =
                super::providers::GeminiEmbeddingProvider::new(settings, &config.model)?;
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: gemini, mock",
            config.provider
        ))),
    }
}
