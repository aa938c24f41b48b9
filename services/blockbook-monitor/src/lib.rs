//! Blockbook monitor - health dashboard for Blockbook indexer servers
//!
//! Polls every configured server's `/api/v2` status endpoint, classifies its
//! health, tracks what changed between polls and serves the result as a web
//! dashboard.

pub mod blockbook;
pub mod changes;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod fetcher;
pub mod io;
pub mod relay;
pub mod state;
pub mod status;
pub mod time_since;
pub mod view;

pub use config::{load_config, Config};
pub use error::{MonitorError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::engine::Engine;
use crate::fetcher::{RetryPolicy, RetryingFetcher};
use crate::io::ReqwestHttpClient;
use crate::relay::Relay;

/// Run the monitor with the given configuration until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let upstream: Arc<dyn io::HttpClient> =
        Arc::new(ReqwestHttpClient::new(config.relay.fetch_timeout)?);
    let relay = Arc::new(Relay::new(&config.relay, upstream));
    let cancel = CancellationToken::new();

    // The engine fetches through the relay, like the browser client does
    let fetcher = RetryingFetcher::new(
        Arc::clone(&relay) as Arc<dyn io::HttpClient>,
        RetryPolicy::from(&config.poll),
    );
    let state = state::new_state_handle(config.servers.clone());
    let engine = Engine::new(
        config.servers.clone(),
        fetcher,
        &config.poll,
        Arc::clone(&state),
        cancel.clone(),
    );

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let router = dashboard::build_router(
            Arc::clone(&state),
            Arc::clone(&relay),
            engine.refresh_trigger(),
        );
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    tracing::info!(
        "Monitoring {} servers every {:?}",
        config.servers.len(),
        config.poll.interval
    );

    // Blocks until cancelled
    engine.run().await;
    tracing::info!("Blockbook monitor stopped");

    Ok(())
}
