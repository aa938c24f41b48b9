//! BDD step definitions for the change detection feature

use cucumber::{given, then, when};

use blockbook_monitor::blockbook::BlockbookResponse;
use blockbook_monitor::changes::diff;
use blockbook_monitor::evaluator::evaluate;
use blockbook_monitor::status::StatusReport;

use crate::world::MonitorWorld;

fn report_for(world: &MonitorWorld, payload: &serde_json::Value) -> StatusReport {
    let response =
        BlockbookResponse::from_json(&payload.to_string()).expect("payload rejected");
    evaluate(&response, world.now())
}

#[given(expr = "the previous payload {string}")]
fn previous_payload(world: &mut MonitorWorld, body: String) {
    world.previous_payload = Some(serde_json::from_str(&body).expect("payload is not JSON"));
}

#[given(expr = "the current payload {string}")]
fn current_payload(world: &mut MonitorWorld, body: String) {
    world.payload = Some(serde_json::from_str(&body).expect("payload is not JSON"));
}

#[when("the reports are compared")]
fn compare_reports(world: &mut MonitorWorld) {
    let current = report_for(world, world.payload.as_ref().expect("current payload not set"));
    let previous = world
        .previous_payload
        .as_ref()
        .map(|payload| report_for(world, payload));
    world.changes = Some(diff(previous.as_ref(), &current));
}

#[then("every field counts as changed")]
fn first_observation(world: &mut MonitorWorld) {
    let changes = world.changes.as_ref().expect("not compared");
    assert!(changes.is_none(), "expected no change set, got {:?}", changes);
}

#[then("nothing changed")]
fn nothing_changed(world: &mut MonitorWorld) {
    let changes = world.changes.clone().expect("not compared");
    assert_eq!(changes, Some(vec![]));
}

#[then(expr = "the changed fields are {string}")]
fn changed_fields_are(world: &mut MonitorWorld, expected: String) {
    let changes = world
        .changes
        .clone()
        .expect("not compared")
        .expect("expected a change set");
    let names: Vec<&str> = changes.iter().map(|f| f.as_str()).collect();
    assert_eq!(names.join(", "), expected);
}
