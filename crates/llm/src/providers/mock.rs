//! Mock LLM client for offline development and tests.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docchat_core::AppResult;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answer returned when no scripted responses are configured.
pub const DEFAULT_MOCK_ANSWER: &str = "Ini adalah jawaban uji dari penyedia tiruan.";

/// Deterministic LLM client.
///
/// Replies with scripted responses in rotation (or a fixed answer) and records
/// every request so tests can inspect the prompts the pipeline produced.
#[derive(Debug)]
pub struct MockLlmClient {
    responses: Vec<String>,
    cursor: AtomicUsize,
    delay: Option<Duration>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            cursor: AtomicUsize::new(0),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with these responses in order, wrapping around at the end.
    pub fn with_responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses = responses.into_iter().map(Into::into).collect();
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().clone()
    }

    fn next_answer(&self) -> String {
        if self.responses.is_empty() {
            return DEFAULT_MOCK_ANSWER.to_string();
        }
        let i = self.cursor.fetch_add(1, Ordering::SeqCst) % self.responses.len();
        self.responses[i].clone()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = self.next_answer();
        let prompt_tokens = request.prompt.split_whitespace().count() as u32;
        let completion_tokens = content.split_whitespace().count() as u32;

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(prompt_tokens, completion_tokens),
            finish_reason: Some("STOP".to_string()),
        })
    }
}
