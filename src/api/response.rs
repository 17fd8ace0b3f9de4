//! The uniform response shape returned by every exposed operation.

use serde::Serialize;

use crate::aggregate::{AggregateResult, AggregateStatus, SourceReport};
use crate::endpoint::EndpointDescriptor;
use crate::error::{AddressFormatError, ConfigError, SourceError};
use crate::registry::SourceSummary;
use crate::session::SessionConfig;

/// Overall status of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Every queried source answered.
    Success,
    /// The request failed; see `message`.
    Error,
    /// Some sources answered; `data` holds their results.
    Partial,
    /// No usable source; `setupGuide` explains how to configure one.
    NoSource,
}

impl ResponseStatus {
    /// The serialised name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Partial => "partial",
            Self::NoSource => "no_source",
        }
    }
}

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HostOrSources {
    /// A call-scoped target.
    Host(String),
    /// Per-source outcomes of an aggregate query.
    Sources(Vec<SourceReport>),
    /// The registered sources, for session operations.
    Registered(Vec<SourceSummary>),
}

/// The response to one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    /// Overall status.
    pub status: ResponseStatus,
    /// Human-readable explanation for anything but plain success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The target or sources involved.
    pub host_or_sources: HostOrSources,
    /// The payload: a single item or the combined list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Remediation text, present exactly when `status` is `no_source`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_guide: Option<String>,
}

impl<T> Response<T> {
    /// A successful response.
    #[must_use]
    pub const fn success(data: T, host_or_sources: HostOrSources) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: None,
            host_or_sources,
            data: Some(data),
            setup_guide: None,
        }
    }

    /// A failed response.
    #[must_use]
    pub fn error(message: impl Into<String>, host_or_sources: HostOrSources) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
            host_or_sources,
            data: None,
            setup_guide: None,
        }
    }

    /// A response for when no source is usable.
    #[must_use]
    pub fn no_source(
        message: impl Into<String>,
        host_or_sources: HostOrSources,
        config: &SessionConfig,
    ) -> Self {
        Self {
            status: ResponseStatus::NoSource,
            message: Some(message.into()),
            host_or_sources,
            data: None,
            setup_guide: Some(setup_guide(config)),
        }
    }
}

/// Why a query never reached the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Rejection {
    /// The call-scoped address did not parse.
    Address {
        input: String,
        error: AddressFormatError,
    },
    /// The call-scoped target could not be connected.
    Unreachable {
        target: EndpointDescriptor,
        error: SourceError,
    },
}

impl Rejection {
    pub(crate) fn into_response<T>(self) -> Response<T> {
        match self {
            Self::Address { input, error } => {
                Response::error(error.to_string(), HostOrSources::Host(input))
            }
            Self::Unreachable { target, error } => Response::error(
                format!("could not reach {target}: {error}"),
                HostOrSources::Host(target.uri()),
            ),
        }
    }
}

/// Which sources an aggregate query ran against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Scope {
    CallScoped(EndpointDescriptor),
    Registry,
}

/// Turn an aggregate result into a response.
///
/// `subject` names what was asked for, e.g. `container 'web'`, and is used
/// in not-found messages. `collect` produces the payload from the
/// successful outcomes.
pub(crate) fn from_aggregate<T, U>(
    scope: &Scope,
    result: AggregateResult<T>,
    subject: &str,
    config: &SessionConfig,
    collect: impl FnOnce(AggregateResult<T>) -> Option<U>,
) -> Response<U> {
    let host_or_sources = match scope {
        Scope::CallScoped(target) => HostOrSources::Host(target.uri()),
        Scope::Registry => HostOrSources::Sources(result.reports()),
    };

    match (result.status(), scope) {
        (AggregateStatus::Success, _) => Response {
            status: ResponseStatus::Success,
            message: None,
            host_or_sources,
            data: collect(result),
            setup_guide: None,
        },
        (AggregateStatus::Partial, _) => {
            let message = format!(
                "answered by {}; unavailable: {}",
                result.answered().join(", "),
                result.failure_summary()
            );
            Response {
                status: ResponseStatus::Partial,
                message: Some(message),
                host_or_sources,
                data: collect(result),
                setup_guide: None,
            }
        }
        (AggregateStatus::NotFound, Scope::CallScoped(target)) => {
            Response::error(format!("{subject} not found on {target}"), host_or_sources)
        }
        (AggregateStatus::NotFound, Scope::Registry) => Response::error(
            format!("{subject} was not found on any configured source"),
            host_or_sources,
        ),
        (AggregateStatus::NoSource, Scope::CallScoped(target)) => Response::error(
            format!("could not reach {target}: {}", result.failure_summary()),
            host_or_sources,
        ),
        (AggregateStatus::NoSource, Scope::Registry) if result.outcomes().is_empty() => {
            Response::no_source(
                ConfigError::NoTargetConfigured.to_string(),
                host_or_sources,
                config,
            )
        }
        (AggregateStatus::NoSource, Scope::Registry) => Response::no_source(
            format!(
                "no configured source could be reached: {}",
                result.failure_summary()
            ),
            host_or_sources,
            config,
        ),
    }
}

/// Remediation text for when no source is usable.
#[must_use]
pub fn setup_guide(config: &SessionConfig) -> String {
    let current = config
        .default_target
        .as_ref()
        .map_or_else(|| String::from("none"), EndpointDescriptor::uri);
    let local = if config.allow_secondary_source {
        "enabled but not answering"
    } else {
        "disabled"
    };

    format!(
        "No container engine source is available.\n\
         Current default target: {current}; local engine ({socket}): {local}.\n\
         To fix this, do one of the following:\n\
         \x20 1. Set a default target for this session with configure_target(\"tcp://<host>:<port>\").\n\
         \x20 2. Start the process with DOCKSCOPE_ENGINE_HOST=tcp://<host>:<port>.\n\
         \x20 3. Enable the local engine with set_secondary_source(true) or DOCKSCOPE_SOURCES_ALLOW_LOCAL=true.\n\
         \x20 4. Pass a target for a single call with host=\"tcp://<host>:<port>\".\n\
         Remote addresses must be written exactly as scheme://host:port; for a remote engine \
         also check that its API port is reachable from here.",
        socket = config.local_socket,
    )
}
