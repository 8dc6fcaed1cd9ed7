//! Gemini Embedding Provider
//!
//! Embeds corpus chunks and queries through the Generative Language API
//! `batchEmbedContents` method. Documents are embedded with the
//! `RETRIEVAL_DOCUMENT` task type and queries with `RETRIEVAL_QUERY`.

use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docchat_core::{AppError, AppResult};
use docchat_llm::types::{
    model_resource, BatchEmbedContentsRequest, BatchEmbedContentsResponse, Content,
    EmbedContentRequest, TaskType,
};
use docchat_llm::{GeminiSettings, GeminiTransport};
use tracing::{debug, instrument};

/// Output dimension of `embedding-001` and `text-embedding-004`
pub const GEMINI_EMBEDDING_DIMENSIONS: usize = 768;

/// Largest batch the API accepts in one `batchEmbedContents` call
const MAX_BATCH_SIZE: usize = 100;

/// Gemini embedding provider.
#[derive(Debug, Clone)]
pub struct GeminiEmbeddingProvider {
    transport: GeminiTransport,
    /// Model resource name (e.g., "models/embedding-001")
    model: String,
}

impl GeminiEmbeddingProvider {
    pub fn new(settings: GeminiSettings, model: &str) -> AppResult<Self> {
        Ok(Self {
            transport: GeminiTransport::new(settings)?,
            model: model_resource(model),
        })
    }

    fn build_request(&self, texts: &[String], task_type: TaskType) -> BatchEmbedContentsRequest {
        BatchEmbedContentsRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: self.model.clone(),
                    content: Content::text(text.clone(), None),
                    task_type,
                })
                .collect(),
        }
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_with_task(
        &self,
        texts: &[String],
        task_type: TaskType,
    ) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH_SIZE) {
            let request = self.build_request(batch, task_type);
            let response: BatchEmbedContentsResponse = self
                .transport
                .post(&self.model, "batchEmbedContents", &request)
                .await?;

            if response.embeddings.len() != batch.len() {
                return Err(AppError::Provider(format!(
                    "Gemini returned {} embeddings for {} texts",
                    response.embeddings.len(),
                    batch.len()
                )));
            }

            embeddings.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        debug!("Embedded {} texts", embeddings.len());
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        GEMINI_EMBEDDING_DIMENSIONS
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_with_task(texts, TaskType::RetrievalDocument).await
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self
            .embed_with_task(&[text.to_string()], TaskType::RetrievalQuery)
            .await?;
        results
            .pop()
            .ok_or_else(|| AppError::Provider("No embedding returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiEmbeddingProvider {
        GeminiEmbeddingProvider::new(GeminiSettings::new("test-key"), "embedding-001").unwrap()
    }

    #[test]
    fn test_model_name_is_resource() {
        assert_eq!(provider().model_name(), "models/embedding-001");
    }

    #[test]
    fn test_build_request_uses_task_type() {
        let texts = vec!["satu".to_string(), "dua".to_string()];
        let request = provider().build_request(&texts, TaskType::RetrievalQuery);

        assert_eq!(request.requests.len(), 2);
        assert_eq!(request.requests[1].content.joined_text(), "dua");
        assert_eq!(request.requests[0].task_type, TaskType::RetrievalQuery);
        assert_eq!(request.requests[0].model, "models/embedding-001");
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let embeddings = provider().embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }
}
