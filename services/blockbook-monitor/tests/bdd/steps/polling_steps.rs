//! BDD step definitions for the polling feature

use std::sync::Arc;
use std::time::{Duration, Instant};

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use blockbook_monitor::config::PollConfig;
use blockbook_monitor::engine::Engine;
use blockbook_monitor::fetcher::{RetryPolicy, RetryingFetcher};
use blockbook_monitor::io::{HttpClient, HttpResponse};
use blockbook_monitor::state::new_state_handle;

use crate::world::MonitorWorld;

fn healthy_payload(height: u64) -> String {
    serde_json::json!({
        "blockbook": {"coin": "Test", "inSync": true, "inSyncMempool": true},
        "backend": {"blocks": height}
    })
    .to_string()
}

#[given(expr = "server {string} answers with a healthy payload at height {int}")]
fn server_answers_healthy(world: &mut MonitorWorld, name: String, height: u64) {
    let server = world.add_server(&name);
    world
        .upstream
        .respond(&server.api_url(), HttpResponse::new(200, healthy_payload(height)));
}

#[when(expr = "server {string} now answers with a healthy payload at height {int}")]
fn server_now_answers_healthy(world: &mut MonitorWorld, name: String, height: u64) {
    let url = world.server(&name).api_url();
    world
        .upstream
        .respond(&url, HttpResponse::new(200, healthy_payload(height)));
}

#[given(expr = "server {string} answers HTTP {int}")]
fn server_answers_status(world: &mut MonitorWorld, name: String, status: u16) {
    let server = world.add_server(&name);
    world
        .upstream
        .respond(&server.api_url(), HttpResponse::new(status, "{}"));
}

#[given(expr = "server {string} answers {string}")]
fn server_answers_body(world: &mut MonitorWorld, name: String, body: String) {
    let server = world.add_server(&name);
    world
        .upstream
        .respond(&server.api_url(), HttpResponse::new(200, body));
}

#[given(expr = "server {string} cannot be reached")]
fn server_unreachable(world: &mut MonitorWorld, name: String) {
    world.add_server(&name);
}

#[when("a poll cycle runs")]
async fn poll_cycle_runs(world: &mut MonitorWorld) {
    let state = world
        .state
        .get_or_insert_with(|| new_state_handle(world.servers.clone()))
        .clone();
    let poll = PollConfig {
        backoff: Duration::from_millis(1),
        update_highlight: Duration::from_secs(60),
        ..PollConfig::default()
    };
    let fetcher = RetryingFetcher::new(
        Arc::clone(&world.upstream) as Arc<dyn HttpClient>,
        RetryPolicy::from(&poll),
    );
    let engine = Engine::new(
        world.servers.clone(),
        fetcher,
        &poll,
        state,
        CancellationToken::new(),
    );
    engine.run_cycle().await;
}

#[then(expr = "server {string} is {string}")]
async fn server_is(world: &mut MonitorWorld, name: String, expected: String) {
    let state = world.state.as_ref().expect("no cycle ran").read().await;
    let index = state
        .position(&world.server(&name).url)
        .expect("server not in state");
    assert_eq!(state.servers[index].report.status.to_string(), expected);
}

#[then(expr = "server {string} shows block height {int}")]
async fn server_height(world: &mut MonitorWorld, name: String, height: u64) {
    let state = world.state.as_ref().expect("no cycle ran").read().await;
    let index = state
        .position(&world.server(&name).url)
        .expect("server not in state");
    assert_eq!(state.servers[index].report.block_height(), Some(height));
}

#[then(expr = "server {string} failed with {string}")]
async fn server_error(world: &mut MonitorWorld, name: String, expected: String) {
    let state = world.state.as_ref().expect("no cycle ran").read().await;
    let index = state
        .position(&world.server(&name).url)
        .expect("server not in state");
    let error = state.servers[index].report.error.clone().unwrap_or_default();
    assert!(
        error.starts_with(&expected),
        "error {:?} does not start with {:?}",
        error,
        expected
    );
}

#[then(expr = "server {string} was requested {int} time(s)")]
fn request_count(world: &mut MonitorWorld, name: String, count: u32) {
    let url = world.server(&name).api_url();
    assert_eq!(world.upstream.request_count(&url), count);
}

#[then(expr = "the changes of server {string} are {string}")]
async fn changes_of(world: &mut MonitorWorld, name: String, expected: String) {
    let state = world.state.as_ref().expect("no cycle ran").read().await;
    let index = state
        .position(&world.server(&name).url)
        .expect("server not in state");
    let changes = state.servers[index]
        .changes
        .clone()
        .expect("expected a change set");
    let names: Vec<&str> = changes.iter().map(|f| f.as_str()).collect();
    assert_eq!(names.join(", "), expected);
}

#[then(expr = "server {string} is highlighted as recently updated")]
async fn highlighted(world: &mut MonitorWorld, name: String) {
    let state = world.state.as_ref().expect("no cycle ran").read().await;
    let index = state
        .position(&world.server(&name).url)
        .expect("server not in state");
    assert!(state.servers[index].is_recently_updated(Instant::now()));
}

#[then(expr = "server {string} is not highlighted")]
async fn not_highlighted(world: &mut MonitorWorld, name: String) {
    let state = world.state.as_ref().expect("no cycle ran").read().await;
    let index = state
        .position(&world.server(&name).url)
        .expect("server not in state");
    assert!(!state.servers[index].is_recently_updated(Instant::now()));
}

#[then("the last update time is set")]
async fn last_update_set(world: &mut MonitorWorld) {
    let state = world.state.as_ref().expect("no cycle ran").read().await;
    assert!(state.last_updated.is_some());
}
