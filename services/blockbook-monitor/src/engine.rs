//! Engine: runs poll cycles over all servers and records the results

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::blockbook::BlockbookResponse;
use crate::config::{OverlapPolicy, PollConfig, ServerConfig};
use crate::evaluator::evaluate;
use crate::fetcher::RetryingFetcher;
use crate::state::StateHandle;
use crate::status::{Severity, StatusReport};
use crate::MonitorError;

/// Requests an extra poll cycle outside the regular interval
#[derive(Debug, Clone, Default)]
pub struct RefreshTrigger {
    notify: Arc<Notify>,
}

impl RefreshTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the engine to run a cycle now
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    pub(crate) async fn requested(&self) {
        self.notify.notified().await;
    }
}

/// Outcome counts of one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub polled: usize,
    pub skipped: usize,
    pub offline: usize,
    pub failed_tasks: usize,
}

/// Clears a server's in-flight flag when its poll task ends, even on panic
struct InFlightGuard {
    flags: Arc<Vec<AtomicBool>>,
    index: usize,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flags[self.index].store(false, Ordering::SeqCst);
    }
}

/// The engine polls every server concurrently on a fixed interval
#[derive(Clone)]
pub struct Engine {
    servers: Arc<Vec<ServerConfig>>,
    fetcher: RetryingFetcher,
    poll: PollConfig,
    state: StateHandle,
    in_flight: Arc<Vec<AtomicBool>>,
    refresh: RefreshTrigger,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        servers: Vec<ServerConfig>,
        fetcher: RetryingFetcher,
        poll: &PollConfig,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        let in_flight = servers.iter().map(|_| AtomicBool::new(false)).collect();
        Self {
            servers: Arc::new(servers),
            fetcher,
            poll: poll.clone(),
            state,
            in_flight: Arc::new(in_flight),
            refresh: RefreshTrigger::new(),
            cancel,
        }
    }

    /// Use an externally created refresh trigger (e.g. shared with the dashboard)
    pub fn with_refresh_trigger(mut self, refresh: RefreshTrigger) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn refresh_trigger(&self) -> RefreshTrigger {
        self.refresh.clone()
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Run poll cycles until the cancellation token is triggered.
    ///
    /// A cycle starts immediately, then on every interval tick and on every
    /// refresh request. Cycles are spawned, so a slow cycle never delays the
    /// next one.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.poll.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = JoinSet::new();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tracing::debug!("Starting scheduled poll cycle");
                }
                _ = self.refresh.requested() => {
                    tracing::info!("Starting poll cycle on refresh request");
                }
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Poll loop cancelled");
                    break;
                }
            }

            let engine = self.clone();
            cycles.spawn(async move { engine.run_cycle().await });

            while let Some(finished) = cycles.try_join_next() {
                if let Err(e) = finished {
                    tracing::error!("Poll cycle task failed: {}", e);
                }
            }
        }

        // Cycles already running complete before the loop returns
        while let Some(finished) = cycles.join_next().await {
            if let Err(e) = finished {
                tracing::error!("Poll cycle task failed: {}", e);
            }
        }
    }

    /// Poll every server once and wait for all of them to finish
    pub async fn run_cycle(&self) -> CycleSummary {
        let mut summary = CycleSummary::default();
        let mut tasks = JoinSet::new();

        for (index, server) in self.servers.iter().enumerate() {
            let guard = match self.poll.overlap {
                OverlapPolicy::Skip => {
                    if self.in_flight[index].swap(true, Ordering::SeqCst) {
                        tracing::debug!(
                            "Skipping {} ({}): previous request still in flight",
                            server.name,
                            server.region
                        );
                        summary.skipped += 1;
                        continue;
                    }
                    Some(InFlightGuard {
                        flags: Arc::clone(&self.in_flight),
                        index,
                    })
                }
                OverlapPolicy::Allow => None,
            };

            let engine = self.clone();
            let server = server.clone();
            tasks.spawn(async move {
                let _guard = guard;
                engine.poll_server(index, &server).await
            });
        }

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(severity) => {
                    summary.polled += 1;
                    if severity == Severity::Offline {
                        summary.offline += 1;
                    }
                }
                Err(e) => {
                    summary.failed_tasks += 1;
                    tracing::error!("Poll task failed: {}", e);
                }
            }
        }

        self.state.write().await.last_updated = Some(Utc::now());
        tracing::debug!(
            "Poll cycle done: {} polled, {} offline, {} skipped",
            summary.polled,
            summary.offline,
            summary.skipped
        );
        summary
    }

    /// Check one server and record the result in the shared state
    async fn poll_server(&self, index: usize, server: &ServerConfig) -> Severity {
        let report = self.check_server(server).await;
        let severity = report.status;

        let changes = self.state.write().await.record(
            index,
            report,
            Utc::now(),
            self.poll.update_highlight,
        );

        match changes {
            Some(None) => {
                tracing::info!("{} ({}): first status {}", server.name, server.region, severity)
            }
            Some(Some(fields)) if !fields.is_empty() => {
                let names: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
                tracing::info!(
                    "{} ({}): {} changed [{}]",
                    server.name,
                    server.region,
                    severity,
                    names.join(", ")
                );
            }
            _ => {}
        }

        severity
    }

    /// Fetch and evaluate one server. Never fails: any error yields an offline report.
    pub async fn check_server(&self, server: &ServerConfig) -> StatusReport {
        match self.fetch_report(&server.api_url()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("{} ({}) is offline: {}", server.name, server.region, e);
                StatusReport::offline(e.to_string())
            }
        }
    }

    async fn fetch_report(&self, url: &str) -> crate::Result<StatusReport> {
        let response = self.fetcher.fetch(url).await?;
        if !response.is_ok() {
            return Err(MonitorError::HttpStatus(response.status));
        }
        let payload = BlockbookResponse::from_json(&response.body)?;
        Ok(evaluate(&payload, Utc::now()))
    }
}
