//! Assertion helpers for aggregate classification behavioural tests.

use std::time::Duration;

use rstest_bdd_macros::then;

use super::StepResult;
use super::state::AggregateState;

#[then("the aggregate status is {expected}")]
fn aggregate_status_is(aggregate_state: &AggregateState, expected: String) -> StepResult<()> {
    let status = aggregate_state
        .status
        .get()
        .ok_or_else(|| String::from("status should be set"))?;
    let actual = serde_json::to_value(status).map_err(|e| e.to_string())?;

    if actual == expected.as_str() {
        Ok(())
    } else {
        Err(format!("expected status {expected}, got {actual}"))
    }
}

#[then("the combined list holds {count} containers")]
fn combined_list_holds(aggregate_state: &AggregateState, count: usize) -> StepResult<()> {
    let origins = aggregate_state
        .combined_sources
        .get()
        .ok_or_else(|| String::from("combined list should be set"))?;

    if origins.len() == count {
        Ok(())
    } else {
        Err(format!("expected {count} containers, got {}", origins.len()))
    }
}

#[then("every combined container came from {label}")]
fn every_container_came_from(aggregate_state: &AggregateState, label: String) -> StepResult<()> {
    let origins = aggregate_state
        .combined_sources
        .get()
        .ok_or_else(|| String::from("combined list should be set"))?;

    match origins.iter().find(|origin| **origin != label) {
        None => Ok(()),
        Some(other) => Err(format!("expected only {label}, found an item from {other}")),
    }
}

#[then("the failure summary mentions {text}")]
fn failure_summary_mentions(aggregate_state: &AggregateState, text: String) -> StepResult<()> {
    let summary = aggregate_state
        .failure_summary
        .get()
        .ok_or_else(|| String::from("failure summary should be set"))?;

    if summary.contains(&text) {
        Ok(())
    } else {
        Err(format!("expected the failure summary to mention '{text}': {summary}"))
    }
}

#[then("the query finished within {millis} ms")]
fn query_finished_within(aggregate_state: &AggregateState, millis: u64) -> StepResult<()> {
    let elapsed = aggregate_state
        .elapsed
        .get()
        .ok_or_else(|| String::from("elapsed time should be set"))?;

    if elapsed < Duration::from_millis(millis) {
        Ok(())
    } else {
        Err(format!("query took {elapsed:?}, expected under {millis} ms"))
    }
}
