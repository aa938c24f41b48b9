//! Configuration types for the blockbook monitor

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_servers")]
    pub servers: Vec<ServerConfig>,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            servers: default_servers(),
            poll: PollConfig::default(),
            relay: RelayConfig::default(),
            dashboard: DashboardConfig::default(),
        }
    }
}

/// A monitored Blockbook server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub region: String,
    /// Base URL including the trailing slash, e.g. `https://btc-eu1.edge.app/`
    pub url: String,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
}

impl ServerConfig {
    pub fn new(name: &str, region: &str, url: &str, accent_color: &str) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            url: url.to_string(),
            accent_color: accent_color.to_string(),
        }
    }

    /// URL of the Blockbook status API for this server
    pub fn api_url(&self) -> String {
        if self.url.ends_with('/') {
            format!("{}api/v2", self.url)
        } else {
            format!("{}/api/v2", self.url)
        }
    }
}

/// How a new poll cycle treats a server whose previous request is still running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Leave the in-flight request alone and skip the server this cycle
    Skip,
    /// Start another request regardless; responses may land out of order
    Allow,
}

/// Poll cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub interval: Duration,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,
    #[serde(default = "default_update_highlight", with = "humantime_serde")]
    pub update_highlight: Duration,
    #[serde(default = "default_overlap")]
    pub overlap: OverlapPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
            update_highlight: default_update_highlight(),
            overlap: default_overlap(),
        }
    }
}

/// Relay (proxy) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Substring every forwarded target URL must contain
    #[serde(default = "default_allowed_domain")]
    pub allowed_domain: String,
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            allowed_domain: default_allowed_domain(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

fn default_servers() -> Vec<ServerConfig> {
    vec![
        ServerConfig::new("Bitcoin", "Europe 1", "https://btc-eu1.edge.app/", "#f7931a"),
        ServerConfig::new("Bitcoin", "West USA 1", "https://btc-wusa1.edge.app/", "#f7931a"),
        ServerConfig::new("Bitcoin Cash", "East USA 1", "https://bch-eusa1.edge.app/", "#10b981"),
        ServerConfig::new("Dash", "West USA 1", "https://dash-wusa1.edge.app/", "#06b6d4"),
        ServerConfig::new("DigiByte", "Europe 1", "https://dgb-eu1.edge.app/", "#6366f1"),
        ServerConfig::new("Dogecoin", "East USA 1", "https://doge-eusa1.edge.app/", "#fbbf24"),
        ServerConfig::new("Firo", "East USA 1", "https://firo-eusa1.edge.app/", "#a855f7"),
        ServerConfig::new("Litecoin", "West USA 1", "https://ltc-wusa1.edge.app/", "#60a5fa"),
        ServerConfig::new("PIVX", "East USA 1", "https://pivx-eusa1.edge.app/", "#ec4899"),
        ServerConfig::new("Qtum", "West USA 1", "https://qtum-wusa1.edge.app/", "#14b8a6"),
        ServerConfig::new("Vertcoin", "West USA 1", "https://vtc-wusa1.edge.app/", "#8b5cf6"),
    ]
}

fn default_accent_color() -> String {
    "#60a5fa".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_millis(500)
}

fn default_update_highlight() -> Duration {
    Duration::from_millis(1500)
}

fn default_overlap() -> OverlapPolicy {
    OverlapPolicy::Skip
}

fn default_allowed_domain() -> String {
    "edge.app/api/v2".to_string()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    8008
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::MonitorError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.poll.max_attempts == 0 {
            return Err(crate::MonitorError::Config(
                "poll.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.poll.interval.is_zero() {
            return Err(crate::MonitorError::Config(
                "poll.interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
