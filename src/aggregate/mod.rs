//! Concurrent fan-out of one read operation across sources.
//!
//! Every source is queried at once and every call is awaited, so latency is
//! that of the slowest source (bounded by the call deadline) and one
//! failure never cancels the others. Per-source failures become data in a
//! [`QueryOutcome`]; the overall [`AggregateStatus`] is derived from them.


use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::{BackendFuture, EngineBackend, TimeoutInvoker};
use crate::error::{FailureClass, SourceError};
use crate::registry::{Source, SourceKind};

/// The combined status of an aggregate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateStatus {
    /// Every source answered.
    Success,
    /// Some sources answered.
    Partial,
    /// No source is configured, or none could be reached.
    NoSource,
    /// Every source was reached and none had the requested resource.
    NotFound,
}

/// What one source produced for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome<T> {
    /// Label of the source.
    pub source: String,
    /// Local or remote.
    pub kind: SourceKind,
    /// The payload or the classified failure.
    pub result: Result<T, SourceError>,
}

impl<T> QueryOutcome<T> {
    /// Whether the source answered.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The failure class, if the source failed.
    #[must_use]
    pub fn failure_class(&self) -> Option<FailureClass> {
        self.result.as_ref().err().map(SourceError::class)
    }

    /// A payload-free view for reporting.
    #[must_use]
    pub fn report(&self) -> SourceReport {
        SourceReport {
            source: self.source.clone(),
            kind: self.kind,
            status: if self.is_ok() {
                OutcomeStatus::Ok
            } else {
                OutcomeStatus::Error
            },
            error: self.result.as_ref().err().map(ToString::to_string),
            error_class: self.failure_class(),
        }
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryOutcome<U> {
        QueryOutcome {
            source: self.source,
            kind: self.kind,
            result: self.result.map(f),
        }
    }
}

/// Whether a single source answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// The source answered.
    Ok,
    /// The source failed.
    Error,
}

/// Per-source entry of `hostOrSources` in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    /// Label of the source.
    pub source: String,
    /// Local or remote.
    pub kind: SourceKind,
    /// Whether the source answered.
    pub status: OutcomeStatus,
    /// What went wrong, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the failure was connectivity or not-found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<FailureClass>,
}

/// An item tagged with the source it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tagged<T> {
    /// Label of the originating source.
    pub source: String,
    /// The item itself.
    #[serde(flatten)]
    pub item: T,
}

/// Outcomes of one query across every source, in registry order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<T> {
    outcomes: Vec<QueryOutcome<T>>,
    status: AggregateStatus,
}

impl<T> AggregateResult<T> {
    /// Classify a set of outcomes.
    #[must_use]
    pub fn new(outcomes: Vec<QueryOutcome<T>>) -> Self {
        let status = classify(&outcomes);
        Self { outcomes, status }
    }

    /// The combined status.
    #[must_use]
    pub const fn status(&self) -> AggregateStatus {
        self.status
    }

    /// Every outcome, in registry order.
    #[must_use]
    pub fn outcomes(&self) -> &[QueryOutcome<T>] {
        &self.outcomes
    }

    /// Payload-free reports, in registry order.
    #[must_use]
    pub fn reports(&self) -> Vec<SourceReport> {
        self.outcomes.iter().map(QueryOutcome::report).collect()
    }

    /// `label: error` for every failed source, joined with `; `.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        self.outcomes
            .iter()
            .filter_map(|outcome| {
                outcome
                    .result
                    .as_ref()
                    .err()
                    .map(|error| format!("{}: {error}", outcome.source))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Labels of the sources that answered.
    #[must_use]
    pub fn answered(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_ok())
            .map(|outcome| outcome.source.as_str())
            .collect()
    }

    /// Transform every successful payload, keeping failures as they are.
    #[must_use]
    pub fn map<U>(self, f: impl Fn(T) -> U) -> AggregateResult<U> {
        AggregateResult {
            outcomes: self
                .outcomes
                .into_iter()
                .map(|outcome| outcome.map(&f))
                .collect(),
            status: self.status,
        }
    }

    /// The first successful payload in registry order.
    #[must_use]
    pub fn into_first_ok(self) -> Option<Tagged<T>> {
        self.outcomes.into_iter().find_map(|outcome| {
            let source = outcome.source;
            outcome.result.ok().map(|item| Tagged { source, item })
        })
    }
}

impl<T, I> AggregateResult<I>
where
    I: IntoIterator<Item = T>,
{
    /// Concatenate every successful list, tagging each item with its source.
    #[must_use]
    pub fn into_combined(self) -> Vec<Tagged<T>> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| outcome.result.ok().map(|items| (outcome.source, items)))
            .flat_map(|(source, items)| {
                items.into_iter().map(move |item| Tagged {
                    source: source.clone(),
                    item,
                })
            })
            .collect()
    }
}

fn classify<T>(outcomes: &[QueryOutcome<T>]) -> AggregateStatus {
    if outcomes.is_empty() {
        return AggregateStatus::NoSource;
    }

    let succeeded = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    if succeeded == outcomes.len() {
        return AggregateStatus::Success;
    }
    if succeeded > 0 {
        return AggregateStatus::Partial;
    }

    let all_not_found = outcomes
        .iter()
        .all(|outcome| outcome.failure_class() == Some(FailureClass::NotFound));
    if all_not_found {
        AggregateStatus::NotFound
    } else {
        AggregateStatus::NoSource
    }
}

/// Issues one operation against many sources at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    invoker: TimeoutInvoker,
}

impl Aggregator {
    /// Create an aggregator whose calls run under `invoker`.
    #[must_use]
    pub const fn new(invoker: TimeoutInvoker) -> Self {
        Self { invoker }
    }

    /// Run `call` against every source concurrently and await them all.
    ///
    /// Outcomes keep the order of `sources`. Each source's observed health
    /// is updated from its outcome.
    pub async fn query<T, F>(
        &self,
        operation: &str,
        sources: &[Arc<Source>],
        call: F,
    ) -> AggregateResult<T>
    where
        F: Fn(Arc<dyn EngineBackend>) -> BackendFuture<'static, T>,
    {
        let calls = sources.iter().map(|source| {
            let pending = call(source.backend());
            async move {
                debug!(source = source.label(), operation, "querying source");
                let result = self.invoker.invoke(operation, pending).await;
                source.record(&result);
                if let Err(error) = &result {
                    warn!(source = source.label(), operation, %error, "source call failed");
                }
                QueryOutcome {
                    source: source.label().to_owned(),
                    kind: source.kind(),
                    result,
                }
            }
        });

        AggregateResult::new(join_all(calls).await)
    }
}
