//! Gemini provider implementation.
//!
//! Talks to the Google Generative Language API:
//! https://ai.google.dev/api/generate-content
//!
//! [`GeminiTransport`] owns the HTTP client, credential and retry policy and is
//! shared with the embedding provider in the knowledge crate.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::retry::{with_retries, CallError, RetryPolicy};
use crate::types::{
    model_resource, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};
use docchat_core::{AppError, AppResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Public API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Per-request HTTP timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the Generative Language API.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the base URL; `None` keeps the public endpoint.
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "Gemini provider requires an API key".to_string(),
            ));
        }
        if self.base_url.is_empty() {
            return Err(AppError::Config("Base URL cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Endpoint URL for a model method, e.g. `generateContent`.
    pub fn method_url(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, model_resource(model), method)
    }
}

/// Authenticated JSON-over-HTTP transport with retries.
#[derive(Debug, Clone)]
pub struct GeminiTransport {
    settings: GeminiSettings,
    client: Client,
}

impl GeminiTransport {
    pub fn new(settings: GeminiSettings) -> AppResult<Self> {
        settings.validate()?;

        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    /// POST `body` to `{model}:{method}` and decode the JSON reply.
    #[instrument(skip(self, body), fields(model = %model))]
    pub async fn post<Req, Resp>(&self, model: &str, method: &str, body: &Req) -> AppResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.settings.method_url(model, method);
        debug!("POST {}", url);

        let url = url.as_str();
        with_retries(self.settings.retry, method, || self.post_once(url, body)).await
    }

    async fn post_once<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp, CallError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(body)
            .send()
            .await
            .map_err(CallError::from_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(CallError::from_reqwest)?;

        if !status.is_success() {
            return Err(CallError::from_status(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            CallError::Fatal(AppError::Provider(format!(
                "Failed to parse provider response: {}",
                e
            )))
        })
    }
}

/// Gemini generation client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    transport: GeminiTransport,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> AppResult<Self> {
        Ok(Self {
            transport: GeminiTransport::new(settings)?,
        })
    }

    pub fn from_transport(transport: GeminiTransport) -> Self {
        Self { transport }
    }

    /// Convert LlmRequest to the generateContent body.
    fn to_gemini_request(&self, request: &LlmRequest) -> GenerateContentRequest {
        let has_config = request.temperature.is_some()
            || request.top_p.is_some()
            || request.max_tokens.is_some();

        GenerateContentRequest {
            contents: vec![Content::text(request.prompt.clone(), Some("user"))],
            system_instruction: request
                .system
                .as_ref()
                .map(|system| Content::text(system.clone(), None)),
            generation_config: has_config.then(|| GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
                max_output_tokens: request.max_tokens,
            }),
        }
    }

    /// Convert the generateContent reply to LlmResponse.
    fn convert_response(
        &self,
        request: &LlmRequest,
        response: GenerateContentResponse,
    ) -> AppResult<LlmResponse> {
        let content = match response.first_text() {
            Some(text) => text,
            None => {
                let reason = response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone())
                    .unwrap_or_else(|| "no candidates returned".to_string());
                return Err(AppError::Provider(format!(
                    "Gemini returned no text: {}",
                    reason
                )));
            }
        };

        let usage = response
            .usage_metadata
            .as_ref()
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response
                .model_version
                .clone()
                .unwrap_or_else(|| request.model.clone()),
            usage,
            finish_reason: response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone()),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %request.model, prompt_len = request.prompt.len()))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        info!("Sending completion request to Gemini");

        let body = self.to_gemini_request(request);
        let response: GenerateContentResponse = self
            .transport
            .post(&request.model, "generateContent", &body)
            .await?;

        let response = self.convert_response(request, response)?;
        info!(
            tokens = response.usage.total_tokens,
            "Received completion from Gemini"
        );
        Ok(response)
    }
}
