//! Scenario state for aggregate classification behavioural tests.

use std::time::Duration;

use dockscope::aggregate::AggregateStatus;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

/// How a scenario's mock source answers.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Behaviour {
    /// Answers a list with this many containers.
    Lists(usize),
    /// Fails every call with a connection error.
    Unreachable,
    /// Answers an inspect with not-found.
    Missing,
    /// Never answers.
    Hangs,
}

#[derive(Default, ScenarioState)]
pub(crate) struct AggregateState {
    pub(crate) sources: Slot<Vec<(String, Behaviour)>>,
    pub(crate) status: Slot<AggregateStatus>,
    pub(crate) combined_sources: Slot<Vec<String>>,
    pub(crate) failure_summary: Slot<String>,
    pub(crate) elapsed: Slot<Duration>,
}

#[fixture]
pub(crate) fn aggregate_state() -> AggregateState {
    let state = AggregateState::default();
    state.sources.set(Vec::new());
    state
}
