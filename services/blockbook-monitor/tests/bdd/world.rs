//! BDD test world for the blockbook monitor

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cucumber::World;

use blockbook_monitor::changes::ChangedFieldSet;
use blockbook_monitor::config::ServerConfig;
use blockbook_monitor::io::{HttpClient, HttpResponse};
use blockbook_monitor::state::StateHandle;
use blockbook_monitor::status::StatusReport;
use blockbook_monitor::MonitorError;

/// Upstream with canned responses per URL that counts every request
#[derive(Debug, Default)]
pub struct FakeUpstream {
    responses: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<HashMap<String, u32>>,
}

impl FakeUpstream {
    pub fn respond(&self, url: &str, response: HttpResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn request_count(&self, url: &str) -> u32 {
        self.requests
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl HttpClient for FakeUpstream {
    async fn get(&self, url: &str) -> blockbook_monitor::Result<HttpResponse> {
        *self
            .requests
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| MonitorError::Http(format!("GET {} failed: connection refused", url)))
    }
}

#[derive(Debug, Default, World)]
pub struct MonitorWorld {
    // Evaluation
    pub payload: Option<serde_json::Value>,
    pub report: Option<StatusReport>,

    // Change detection
    pub previous_payload: Option<serde_json::Value>,
    pub changes: Option<Option<ChangedFieldSet>>,

    // Polling
    pub servers: Vec<ServerConfig>,
    pub upstream: Arc<FakeUpstream>,
    pub state: Option<StateHandle>,
}

impl MonitorWorld {
    /// Fixed wall clock used by the evaluation scenarios
    pub fn now(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    pub fn server(&self, name: &str) -> &ServerConfig {
        self.servers
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("unknown server {}", name))
    }

    /// Register a server named `name`, once
    pub fn add_server(&mut self, name: &str) -> ServerConfig {
        if let Some(existing) = self.servers.iter().find(|s| s.name == name) {
            return existing.clone();
        }
        let url = format!("https://{}.edge.app/", name.to_lowercase());
        let server = ServerConfig::new(name, "Test", &url, "#60a5fa");
        self.servers.push(server.clone());
        server
    }
}
