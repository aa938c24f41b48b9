//! BDD step definitions for the health evaluation feature

use chrono::Duration;
use cucumber::{given, then, when};

use blockbook_monitor::blockbook::BlockbookResponse;
use blockbook_monitor::evaluator::evaluate;

use crate::world::MonitorWorld;

fn payload_mut(world: &mut MonitorWorld) -> &mut serde_json::Value {
    world
        .payload
        .get_or_insert_with(|| serde_json::json!({"blockbook": {}, "backend": {}}))
}

#[given(expr = "a Blockbook payload {string}")]
fn blockbook_payload(world: &mut MonitorWorld, body: String) {
    world.payload = Some(serde_json::from_str(&body).expect("payload is not JSON"));
}

#[given(expr = "the last block was mined {int} hours ago")]
fn last_block_hours_ago(world: &mut MonitorWorld, hours: i64) {
    let mined = (world.now() - Duration::hours(hours)).to_rfc3339();
    let payload = payload_mut(world);
    if !payload["blockbook"].is_object() {
        payload["blockbook"] = serde_json::json!({});
    }
    payload["blockbook"]["lastBlockTime"] = serde_json::Value::String(mined);
}

#[when("the payload is evaluated")]
fn evaluate_payload(world: &mut MonitorWorld) {
    let payload = world.payload.as_ref().expect("payload not set").to_string();
    let response = BlockbookResponse::from_json(&payload).expect("payload rejected");
    world.report = Some(evaluate(&response, world.now()));
}

#[then(expr = "the status is {string}")]
fn status_is(world: &mut MonitorWorld, expected: String) {
    let report = world.report.as_ref().expect("not evaluated");
    assert_eq!(report.status.to_string(), expected);
}

#[then("there are no warnings")]
fn no_warnings(world: &mut MonitorWorld) {
    let report = world.report.as_ref().expect("not evaluated");
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
}

#[then("there are no errors")]
fn no_errors(world: &mut MonitorWorld) {
    let report = world.report.as_ref().expect("not evaluated");
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);
}

#[then(expr = "the warnings are {string}")]
fn warnings_are(world: &mut MonitorWorld, expected: String) {
    let report = world.report.as_ref().expect("not evaluated");
    assert_eq!(report.warnings.join(" | "), expected);
}

#[then(expr = "the errors are {string}")]
fn errors_are(world: &mut MonitorWorld, expected: String) {
    let report = world.report.as_ref().expect("not evaluated");
    assert_eq!(report.errors.join(" | "), expected);
}
