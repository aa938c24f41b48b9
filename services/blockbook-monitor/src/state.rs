//! Shared state: latest report per server and last cycle time

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::changes::{diff, ChangedField, ChangedFieldSet};
use crate::config::ServerConfig;
use crate::status::{Severity, StatusReport};

/// Latest known state of a single server
#[derive(Debug, Clone)]
pub struct ServerStatus {
    pub server: ServerConfig,
    /// Current report; `checking` until the first poll completes
    pub report: StatusReport,
    /// Fields changed by the last poll, `None` after the first observation.
    /// Kept until the next poll; see [`ServerStatus::highlighted_fields`].
    pub changes: Option<ChangedFieldSet>,
    pub polls: u64,
    pub consecutive_failures: u32,
    pub last_poll: Option<DateTime<Utc>>,
    pub highlight_until: Option<Instant>,
}

impl ServerStatus {
    fn new(server: ServerConfig) -> Self {
        Self {
            server,
            report: StatusReport::checking(),
            changes: None,
            polls: 0,
            consecutive_failures: 0,
            last_poll: None,
            highlight_until: None,
        }
    }

    /// Whether the current report is the first one received for this server
    pub fn is_first_observation(&self) -> bool {
        self.polls == 1
    }

    /// Whether the last poll changed something within the highlight window
    pub fn is_recently_updated(&self, now: Instant) -> bool {
        self.highlight_until.is_some_and(|until| now < until)
    }

    /// Changed fields to highlight at `now`; empty once the window has passed
    pub fn highlighted_fields(&self, now: Instant) -> &[ChangedField] {
        match &self.changes {
            Some(fields) if self.is_recently_updated(now) => fields,
            _ => &[],
        }
    }
}

/// Shared state accessible by engine and dashboard
#[derive(Debug)]
pub struct SharedState {
    pub servers: Vec<ServerStatus>,
    /// Completion time of the most recent poll cycle
    pub last_updated: Option<DateTime<Utc>>,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(servers: Vec<ServerConfig>) -> Self {
        Self {
            servers: servers.into_iter().map(ServerStatus::new).collect(),
            last_updated: None,
            started_at: Instant::now(),
        }
    }

    /// Store a new report for the server at `index` and return its change set.
    ///
    /// The outer `None` means the index is unknown. A present, non-empty
    /// change set marks the server as recently updated for `highlight`.
    pub fn record(
        &mut self,
        index: usize,
        report: StatusReport,
        now: DateTime<Utc>,
        highlight: Duration,
    ) -> Option<Option<ChangedFieldSet>> {
        let status = self.servers.get_mut(index)?;

        let previous = (status.polls > 0).then_some(&status.report);
        let changes = diff(previous, &report);

        if report.status == Severity::Offline {
            status.consecutive_failures += 1;
        } else {
            status.consecutive_failures = 0;
        }

        status.highlight_until = match &changes {
            Some(fields) if !fields.is_empty() => Some(Instant::now() + highlight),
            _ => status.highlight_until,
        };
        status.report = report;
        status.changes = changes.clone();
        status.polls += 1;
        status.last_poll = Some(now);

        Some(changes)
    }

    /// Current report of the server at `index`
    pub fn report(&self, index: usize) -> Option<&StatusReport> {
        self.servers.get(index).map(|s| &s.report)
    }

    /// Index of the server with the given base URL
    pub fn position(&self, url: &str) -> Option<usize> {
        self.servers.iter().position(|s| s.server.url == url)
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(servers: Vec<ServerConfig>) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(servers)))
}
