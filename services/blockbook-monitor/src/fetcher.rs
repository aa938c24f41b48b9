//! GET with bounded retries on HTTP 500 and transport errors

use std::sync::Arc;
use std::time::Duration;

use crate::config::PollConfig;
use crate::io::{HttpClient, HttpResponse};
use crate::MonitorError;

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl From<&PollConfig> for RetryPolicy {
    fn from(config: &PollConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: config.backoff,
        }
    }
}

/// Fetches URLs through an [`HttpClient`], retrying transient failures
#[derive(Clone)]
pub struct RetryingFetcher {
    http: Arc<dyn HttpClient>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(http: Arc<dyn HttpClient>, policy: RetryPolicy) -> Self {
        Self { http, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch `url`.
    ///
    /// Any response other than HTTP 500 is returned as-is on first sight,
    /// including other error statuses. HTTP 500 and transport errors are
    /// retried after a fixed backoff until the attempts run out, then the
    /// last error is returned.
    pub async fn fetch(&self, url: &str) -> crate::Result<HttpResponse> {
        let attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.http.get(url).await {
                Ok(response) if response.status != 500 => return Ok(response),
                Ok(response) => {
                    last_error = Some(MonitorError::HttpStatus(response.status));
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }

            if attempt < attempts {
                tracing::warn!(
                    "GET {} failed ({}), retrying ({}/{})",
                    url,
                    last_error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_default(),
                    attempt,
                    attempts - 1
                );
                tokio::time::sleep(self.policy.backoff).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| MonitorError::Http("Fetch failed after retries".to_string())))
    }
}
