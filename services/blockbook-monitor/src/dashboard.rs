//! Web dashboard: HTML cards, JSON API and the Blockbook relay

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::engine::RefreshTrigger;
use crate::relay::Relay;
use crate::state::StateHandle;
use crate::view::{cards, escape_html};

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub relay: Arc<Relay>,
    pub refresh: RefreshTrigger,
}

#[derive(Debug, Deserialize)]
struct ProxyQuery {
    url: Option<String>,
}

/// Build the dashboard axum router
pub fn build_router(state: StateHandle, relay: Arc<Relay>, refresh: RefreshTrigger) -> Router {
    let dashboard_state = DashboardState {
        state,
        relay,
        refresh,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/status", get(status_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/proxy", get(proxy_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(dashboard_state)
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let card_html: String = cards(&state, Utc::now(), Instant::now())
        .iter()
        .map(|c| c.to_html())
        .collect();
    let last_updated = state
        .last_updated
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "Never".to_string());

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Edge Blockbook Servers</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 1200px; margin: 0 auto; padding: 1rem; background: #f5f5f7; }}
        header {{ display: flex; align-items: center; gap: 1rem; flex-wrap: wrap; }}
        #grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(300px, 1fr)); gap: 1rem; }}
        .card {{ background: #fff; border-radius: 0.5rem; border-top: 4px solid; padding: 1rem; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }}
        .card.updated {{ box-shadow: 0 0 0 2px #007aff; }}
        .card-header {{ display: flex; justify-content: space-between; align-items: center; margin-bottom: 0.5rem; }}
        .name {{ font-weight: 600; }}
        .region {{ color: #6e6e73; font-size: 0.85em; }}
        .row {{ display: flex; justify-content: space-between; padding: 0.25rem 0; border-bottom: 1px solid #eee; }}
        .row.changed {{ background: #fff3cd; }}
        .label {{ color: #6e6e73; }}
        .good {{ color: #155724; }}
        .bad {{ color: #721c24; }}
        .dot {{ width: 0.75rem; height: 0.75rem; border-radius: 50%; display: inline-block; }}
        .status-online {{ color: #155724; background-color: #34c759; }}
        .status-warning {{ color: #856404; background-color: #ffcc00; }}
        .status-error {{ color: #721c24; background-color: #ff3b30; }}
        .status-offline {{ color: #383d41; background-color: #8e8e93; }}
        .status-checking {{ color: #004085; background-color: #007aff; }}
        .value.status-online, .value.status-warning, .value.status-error, .value.status-offline, .value.status-checking {{ background-color: transparent; font-weight: 600; }}
        .warning {{ color: #856404; background: #fff3cd; padding: 0.25rem 0.5rem; margin-top: 0.5rem; border-radius: 0.25rem; }}
        .error {{ color: #721c24; background: #f8d7da; padding: 0.25rem 0.5rem; margin-top: 0.5rem; border-radius: 0.25rem; }}
    </style>
    <script>
        async function refreshNow() {{
            await fetch('/api/refresh', {{ method: 'POST' }});
            setTimeout(refreshData, 1000);
        }}
        function refreshData() {{
            fetch('/api/status')
                .then(r => r.json())
                .then(data => {{
                    document.getElementById('last-updated').textContent = data.last_updated
                        ? new Date(data.last_updated).toLocaleTimeString()
                        : 'Never';
                    document.getElementById('grid').innerHTML = data.servers.map(s => s.html).join('');
                }});
        }}
        setInterval(refreshData, 5000);
    </script>
</head>
<body>
    <header>
        <h1>Edge Blockbook Servers</h1>
        <span>Last updated: <span id="last-updated">{last_updated}</span></span>
        <button onclick="refreshNow()">Refresh Now</button>
    </header>
    <main id="grid">{card_html}</main>
</body>
</html>"#,
        last_updated = escape_html(&last_updated),
        card_html = card_html,
    );

    Html(html)
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let servers: Vec<serde_json::Value> = state
        .servers
        .iter()
        .zip(cards(&state, Utc::now(), Instant::now()))
        .map(|(s, card)| {
            serde_json::json!({
                "html": card.to_html(),
                "card": card,
                "report": s.report,
                "polls": s.polls,
                "consecutive_failures": s.consecutive_failures,
                "last_poll": s.last_poll.map(|t| t.to_rfc3339()),
            })
        })
        .collect();

    axum::Json(serde_json::json!({
        "last_updated": state.last_updated.map(|t| t.to_rfc3339()),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "servers": servers,
    }))
}

async fn refresh_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    tracing::debug!("Refresh requested via dashboard");
    dashboard.refresh.trigger();
    StatusCode::ACCEPTED
}

async fn proxy_handler(
    State(dashboard): State<DashboardState>,
    Query(query): Query<ProxyQuery>,
) -> Response {
    let relayed = dashboard.relay.forward(query.url.as_deref()).await;
    let status = StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        relayed.body,
    )
        .into_response()
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
