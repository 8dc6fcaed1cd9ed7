//! Retry with exponential backoff for provider calls.

use docchat_core::{AppError, AppResult};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 250;

/// How many times a failed call is retried and how long to wait in between.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Outcome of a single failed provider call.
#[derive(Debug)]
pub enum CallError {
    /// Rate limiting, server errors, dropped connections
    Retryable(AppError),
    /// Everything a retry cannot fix (bad request, bad credential, bad payload)
    Fatal(AppError),
}

impl CallError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_error_message(body);
        let err = AppError::Provider(format!("API error ({}): {}", status, message));

        if status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
            || status.is_server_error()
        {
            CallError::Retryable(err)
        } else {
            CallError::Fatal(err)
        }
    }

    /// Classify a transport-level failure.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let retryable = err.is_timeout() || err.is_connect() || err.is_request();
        let err = AppError::Provider(format!("Request failed: {}", err));
        if retryable {
            CallError::Retryable(err)
        } else {
            CallError::Fatal(err)
        }
    }

    pub fn into_inner(self) -> AppError {
        match self {
            CallError::Retryable(e) | CallError::Fatal(e) => e,
        }
    }
}

/// Pull `error.message` out of a Google API error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Unknown error".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

/// Run `call` until it succeeds, fails fatally, or the retries run out.
///
/// The error of the last attempt is returned when every attempt fails.
pub async fn with_retries<T, F, Fut>(policy: RetryPolicy, operation: &str, mut call: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    let mut attempt = 0;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(CallError::Fatal(e)) => return Err(e),
            Err(CallError::Retryable(e)) => {
                if attempt >= policy.max_retries {
                    return Err(e);
                }
                attempt += 1;

                let backoff = policy.backoff(attempt);
                warn!(
                    "{} failed (retry {}/{}), retrying in {}ms: {}",
                    operation,
                    attempt,
                    policy.max_retries,
                    backoff.as_millis(),
                    e
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
