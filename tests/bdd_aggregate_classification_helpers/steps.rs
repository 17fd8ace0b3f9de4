//! Given/when steps for aggregate classification scenarios.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dockscope::aggregate::{AggregateResult, Aggregator};
use dockscope::endpoint::EndpointDescriptor;
use dockscope::engine::{BackendFuture, EngineBackend, TimeoutInvoker};
use dockscope::error::SourceError;
use dockscope::format::raw::{
    RawContainer, RawContainerDetail, RawImage, RawImageDetail, RawStats,
};
use dockscope::registry::Source;
use mockall::mock;
use rstest_bdd_macros::{given, when};

use super::StepResult;
use super::state::{AggregateState, Behaviour};

const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

mock! {
    #[derive(Debug)]
    AggBackend {}

    impl EngineBackend for AggBackend {
        fn ping<'a>(&'a self) -> BackendFuture<'a, ()>;
        fn list_containers<'a>(&'a self, all: bool) -> BackendFuture<'a, Vec<RawContainer>>;
        fn inspect_container<'a>(&'a self, id: String) -> BackendFuture<'a, RawContainerDetail>;
        fn container_logs<'a>(&'a self, id: String, tail: u32) -> BackendFuture<'a, String>;
        fn container_stats<'a>(&'a self, id: String) -> BackendFuture<'a, RawStats>;
        fn list_images<'a>(&'a self) -> BackendFuture<'a, Vec<RawImage>>;
        fn inspect_image<'a>(&'a self, id: String) -> BackendFuture<'a, RawImageDetail>;
    }
}

fn refused() -> SourceError {
    SourceError::ConnectionFailed {
        message: String::from("connection refused"),
    }
}

fn containers(label: &str, count: usize) -> Vec<RawContainer> {
    (0..count)
        .map(|index| RawContainer {
            id: format!("{label}-{index}"),
            names: vec![format!("/{label}-{index}")],
            state: String::from("running"),
            ..RawContainer::default()
        })
        .collect()
}

fn backend_for(label: &str, behaviour: Behaviour) -> MockAggBackend {
    let mut backend = MockAggBackend::new();
    match behaviour {
        Behaviour::Lists(count) => {
            let listed = containers(label, count);
            backend.expect_list_containers().returning(move |_| {
                let answer = listed.clone();
                Box::pin(async move { Ok(answer) })
            });
        }
        Behaviour::Unreachable => {
            backend
                .expect_list_containers()
                .returning(|_| Box::pin(async { Err(refused()) }));
            backend
                .expect_inspect_container()
                .returning(|_| Box::pin(async { Err(refused()) }));
        }
        Behaviour::Missing => {
            backend.expect_inspect_container().returning(|id| {
                Box::pin(async move {
                    Err(SourceError::NotFound {
                        resource: String::from("container"),
                        id,
                    })
                })
            });
        }
        Behaviour::Hangs => {
            backend.expect_list_containers().returning(|_| {
                Box::pin(std::future::pending::<Result<Vec<RawContainer>, SourceError>>())
            });
        }
    }
    backend
}

fn build_sources(specs: &[(String, Behaviour)]) -> StepResult<Vec<Arc<Source>>> {
    specs
        .iter()
        .enumerate()
        .map(|(index, (label, behaviour))| {
            let address = format!("tcp://10.0.0.{}:2375", index + 1);
            let descriptor = EndpointDescriptor::parse(&address).map_err(|e| e.to_string())?;
            let backend: Arc<dyn EngineBackend> = Arc::new(backend_for(label, *behaviour));
            Ok(Arc::new(Source::new(label.clone(), descriptor, backend)))
        })
        .collect()
}

fn add_source(aggregate_state: &AggregateState, label: String, behaviour: Behaviour) {
    let mut sources = aggregate_state.sources.get().unwrap_or_default();
    sources.push((label, behaviour));
    aggregate_state.sources.set(sources);
}

/// Run `call` against the scenario's sources and record the outcome.
fn run<T, F>(
    aggregate_state: &AggregateState,
    operation: &str,
    deadline: Duration,
    call: F,
) -> StepResult<AggregateResult<T>>
where
    F: Fn(Arc<dyn EngineBackend>) -> BackendFuture<'static, T>,
{
    let specs = aggregate_state.sources.get().unwrap_or_default();
    let sources = build_sources(&specs)?;
    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    let aggregator = Aggregator::new(TimeoutInvoker::new(deadline));

    let started = Instant::now();
    let result = runtime.block_on(aggregator.query(operation, &sources, call));
    aggregate_state.elapsed.set(started.elapsed());
    aggregate_state.status.set(result.status());
    aggregate_state.failure_summary.set(result.failure_summary());
    Ok(result)
}

fn list_with_deadline(aggregate_state: &AggregateState, deadline: Duration) -> StepResult<()> {
    let result = run(
        aggregate_state,
        "list_containers",
        deadline,
        |backend| -> BackendFuture<'static, Vec<RawContainer>> {
            Box::pin(async move { backend.list_containers(true).await })
        },
    )?;
    let origins = result
        .into_combined()
        .into_iter()
        .map(|tagged| tagged.source)
        .collect();
    aggregate_state.combined_sources.set(origins);
    Ok(())
}

#[given("a source named {label} that lists {count} containers")]
fn source_that_lists(aggregate_state: &AggregateState, label: String, count: usize) {
    add_source(aggregate_state, label, Behaviour::Lists(count));
}

#[given("a source named {label} that is unreachable")]
fn source_that_is_unreachable(aggregate_state: &AggregateState, label: String) {
    add_source(aggregate_state, label, Behaviour::Unreachable);
}

#[given("a source named {label} that does not have the container")]
fn source_without_container(aggregate_state: &AggregateState, label: String) {
    add_source(aggregate_state, label, Behaviour::Missing);
}

#[given("a source named {label} that never answers")]
fn source_that_never_answers(aggregate_state: &AggregateState, label: String) {
    add_source(aggregate_state, label, Behaviour::Hangs);
}

#[when("containers are listed across all sources")]
fn containers_are_listed(aggregate_state: &AggregateState) -> StepResult<()> {
    list_with_deadline(aggregate_state, DEFAULT_DEADLINE)
}

#[when("containers are listed with a {millis} ms deadline")]
fn containers_are_listed_with_deadline(
    aggregate_state: &AggregateState,
    millis: u64,
) -> StepResult<()> {
    list_with_deadline(aggregate_state, Duration::from_millis(millis))
}

#[when("a container is inspected across all sources")]
fn container_is_inspected(aggregate_state: &AggregateState) -> StepResult<()> {
    let result = run(
        aggregate_state,
        "inspect_container",
        DEFAULT_DEADLINE,
        |backend| -> BackendFuture<'static, RawContainerDetail> {
            Box::pin(async move { backend.inspect_container(String::from("web")).await })
        },
    )?;
    let origins = result
        .into_first_ok()
        .map(|tagged| tagged.source)
        .into_iter()
        .collect();
    aggregate_state.combined_sources.set(origins);
    Ok(())
}
