//! Relay that forwards GET requests to allow-listed Blockbook servers
//!
//! Backs the `/api/proxy` route and is also the transport the poll engine
//! fetches through. Failures never surface as `Err`: they become the HTTP
//! response a client of the proxy route would see (400 or 500 with a JSON
//! error body).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::RelayConfig;
use crate::io::{HttpClient, HttpResponse};
use crate::MonitorError;

pub const MISSING_URL: &str = "Missing url parameter";
pub const INVALID_URL: &str = "Invalid URL - only edge.app Blockbook endpoints allowed";
pub const FETCH_FAILED: &str = "Failed to fetch from Blockbook server";

/// Forwards requests to targets containing the allowed domain
pub struct Relay {
    upstream: Arc<dyn HttpClient>,
    allowed_domain: String,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("allowed_domain", &self.allowed_domain)
            .finish()
    }
}

impl Relay {
    pub fn new(config: &RelayConfig, upstream: Arc<dyn HttpClient>) -> Self {
        Self {
            upstream,
            allowed_domain: config.allowed_domain.clone(),
        }
    }

    /// Whether `target` may be forwarded
    pub fn is_allowed(&self, target: &str) -> bool {
        target.contains(&self.allowed_domain)
    }

    /// Forward a GET to `target` and build the relay's response
    pub async fn forward(&self, target: Option<&str>) -> HttpResponse {
        let target = match target {
            Some(t) if !t.is_empty() => t,
            _ => return json_response(400, &json!({ "error": MISSING_URL })),
        };

        if !self.is_allowed(target) {
            tracing::debug!("Rejected relay target {}", target);
            return json_response(400, &json!({ "error": INVALID_URL }));
        }

        match self.fetch_json(target).await {
            Ok(body) => json_response(200, &body),
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", target, e);
                json_response(
                    500,
                    &json!({ "error": e.to_string(), "message": FETCH_FAILED }),
                )
            }
        }
    }

    async fn fetch_json(&self, target: &str) -> crate::Result<serde_json::Value> {
        let response = self.upstream.get(target).await?;
        if !response.is_ok() {
            return Err(MonitorError::HttpStatus(response.status));
        }
        Ok(serde_json::from_str(&response.body)?)
    }
}

#[async_trait]
impl HttpClient for Relay {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        Ok(self.forward(Some(url)).await)
    }
}

fn json_response(status: u16, body: &serde_json::Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string())
}
