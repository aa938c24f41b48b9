//! Severity and status report types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::blockbook::{BackendInfo, BlockbookInfo};

/// Health classification of one server at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Online,
    Warning,
    Error,
    /// The server could not be reached or returned an unusable response
    Offline,
    /// No poll has completed for the server yet
    Checking,
}

impl Severity {
    /// Label shown on the dashboard card
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Online => "HEALTHY",
            Severity::Warning => "DEGRADED",
            Severity::Error => "ERROR",
            Severity::Offline => "OFFLINE",
            Severity::Checking => "CHECKING",
        }
    }

    /// Whether the payload details (coin, height, sync...) are meaningful
    pub fn has_details(&self) -> bool {
        !matches!(self, Severity::Offline | Severity::Checking)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Online => write!(f, "online"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Offline => write!(f, "offline"),
            Severity::Checking => write!(f, "checking"),
        }
    }
}

/// Normalized health verdict for one server, produced once per poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: Severity,
    pub blockbook: BlockbookInfo,
    pub backend: BackendInfo,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Connection failure message, only set when `status` is offline
    pub error: Option<String>,
}

impl StatusReport {
    /// Placeholder shown before the first poll completes
    pub fn checking() -> Self {
        Self {
            status: Severity::Checking,
            blockbook: BlockbookInfo::default(),
            backend: BackendInfo::default(),
            warnings: Vec::new(),
            errors: Vec::new(),
            error: None,
        }
    }

    /// Report for a server that could not be fetched or parsed
    pub fn offline(message: impl Into<String>) -> Self {
        Self {
            status: Severity::Offline,
            error: Some(message.into()),
            ..Self::checking()
        }
    }

    /// Displayed block height: the backend block count, else the indexer's best height
    pub fn block_height(&self) -> Option<u64> {
        self.backend.blocks.or(self.blockbook.best_height)
    }
}
