//! A registered source and its observed health.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::endpoint::{EndpointDescriptor, Transport};
use crate::engine::EngineBackend;
use crate::error::SourceError;

/// How a source is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The engine on this host.
    Local,
    /// An engine reached over the network.
    Remote,
}

impl From<Transport> for SourceKind {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Local => Self::Local,
            Transport::Remote => Self::Remote,
        }
    }
}

/// The last status observed for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    /// The last call reached the engine.
    Connected,
    /// The last call could not reach the engine.
    Disconnected,
    /// The engine answered with an error.
    Error,
}

#[derive(Debug, Clone)]
struct Health {
    status: SourceStatus,
    last_error: Option<String>,
}

/// A named backend connection.
///
/// The handle is fixed for the source's lifetime; only the observed health
/// changes. Rebuilding the registry creates new sources rather than
/// mutating these.
pub struct Source {
    label: String,
    kind: SourceKind,
    descriptor: EndpointDescriptor,
    backend: Arc<dyn EngineBackend>,
    health: Mutex<Health>,
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("descriptor", &self.descriptor)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Source {
    /// Create a source. New sources start as connected: remote sources are
    /// registered optimistically and local sources only after a probe.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        descriptor: EndpointDescriptor,
        backend: Arc<dyn EngineBackend>,
    ) -> Self {
        Self {
            label: label.into(),
            kind: descriptor.transport().into(),
            descriptor,
            backend,
            health: Mutex::new(Health {
                status: SourceStatus::Connected,
                last_error: None,
            }),
        }
    }

    /// Display label, unique within a registry.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Local or remote.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The endpoint this source talks to.
    #[must_use]
    pub const fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    /// The engine handle.
    #[must_use]
    pub fn backend(&self) -> Arc<dyn EngineBackend> {
        Arc::clone(&self.backend)
    }

    /// Last observed status.
    #[must_use]
    pub fn status(&self) -> SourceStatus {
        self.health.lock().unwrap_or_else(PoisonError::into_inner).status
    }

    /// Last observed error, cleared on success.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_error
            .clone()
    }

    /// Record the outcome of a call against this source.
    ///
    /// A not-found answer proves the engine is reachable, so it counts as
    /// connected.
    pub fn record<T>(&self, result: &Result<T, SourceError>) {
        let mut health = self.health.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(_) | Err(SourceError::NotFound { .. }) => {
                health.status = SourceStatus::Connected;
                health.last_error = None;
            }
            Err(error @ SourceError::EngineRejected { .. }) => {
                health.status = SourceStatus::Error;
                health.last_error = Some(error.to_string());
            }
            Err(error) => {
                health.status = SourceStatus::Disconnected;
                health.last_error = Some(error.to_string());
            }
        }
    }

    /// A serialisable view of this source.
    #[must_use]
    pub fn summary(&self) -> SourceSummary {
        let health = self
            .health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        SourceSummary {
            label: self.label.clone(),
            kind: self.kind,
            endpoint: self.descriptor.uri(),
            status: health.status,
            last_error: health.last_error,
        }
    }
}

/// What `list_sources` reports for each source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    /// Display label.
    pub label: String,
    /// Local or remote.
    pub kind: SourceKind,
    /// Endpoint URI.
    pub endpoint: String,
    /// Last observed status.
    pub status: SourceStatus,
    /// Last observed error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
