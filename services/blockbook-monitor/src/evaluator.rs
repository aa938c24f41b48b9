//! Status evaluator: classifies a Blockbook payload into a [`StatusReport`]
//!
//! Checks run in a fixed order and may only escalate the severity:
//! `online` can become `warning`, anything can become `error`, and nothing
//! lowers `error`. The evaluator never produces `offline` or `checking`.

use chrono::{DateTime, Utc};

use crate::blockbook::BlockbookResponse;
use crate::status::{Severity, StatusReport};
use crate::time_since::parse_timestamp;

const MS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;

/// Hours since the last block above which the chain counts as stalled
pub const STALLED_AFTER_HOURS: f64 = 24.0;

/// Hours since the last block above which the server counts as lagging
pub const LAGGING_AFTER_HOURS: f64 = 2.0;

/// Accumulates the outcome of the health checks
#[derive(Debug)]
struct Verdict {
    status: Severity,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl Verdict {
    fn new() -> Self {
        Self {
            status: Severity::Online,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        if self.status == Severity::Online {
            self.status = Severity::Warning;
        }
        self.warnings.push(message);
    }

    fn fail(&mut self, message: String) {
        self.status = Severity::Error;
        self.errors.push(message);
    }
}

/// Evaluate a parsed response against the wall clock reading `now`
pub fn evaluate(response: &BlockbookResponse, now: DateTime<Utc>) -> StatusReport {
    let blockbook = &response.blockbook;
    let backend = &response.backend;
    let mut verdict = Verdict::new();

    if let Some(error) = backend.error_message() {
        verdict.fail(format!("Backend error: {}", error));
    }

    if let Some(warnings) = &backend.warnings {
        let trimmed = warnings.trim();
        if !trimmed.is_empty() {
            verdict.warn(trimmed.to_string());
        }
    }

    if blockbook.in_sync == Some(false) {
        verdict.warn("Blockbook not synchronized".to_string());
    }

    if blockbook.in_sync_mempool == Some(false) {
        verdict.warn("Mempool not synchronized".to_string());
    }

    if let Some(hours) = blockbook
        .last_block_time
        .as_deref()
        .and_then(|t| hours_since(t, now))
    {
        if hours > STALLED_AFTER_HOURS {
            verdict.fail(format!(
                "Last block was {} days ago - chain may be stalled",
                (hours / 24.0).floor() as i64
            ));
        } else if hours > LAGGING_AFTER_HOURS {
            verdict.warn(format!("Last block was {} hours ago", hours.floor() as i64));
        }
    }

    tracing::trace!(
        "Evaluated payload: {} ({} warnings, {} errors)",
        verdict.status,
        verdict.warnings.len(),
        verdict.errors.len()
    );

    StatusReport {
        status: verdict.status,
        blockbook: blockbook.clone(),
        backend: backend.clone(),
        warnings: verdict.warnings,
        errors: verdict.errors,
        error: None,
    }
}

/// Fractional hours elapsed since `timestamp`, `None` if it cannot be parsed
fn hours_since(timestamp: &str, now: DateTime<Utc>) -> Option<f64> {
    let then = parse_timestamp(timestamp)?;
    Some((now - then).num_milliseconds() as f64 / MS_PER_HOUR)
}
