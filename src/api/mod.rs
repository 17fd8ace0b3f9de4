//! Operations exposed to the calling agent.
//!
//! [`Inspector`] ties the session store, the source registry and the
//! aggregator together. Each query resolves its target, fans the call out,
//! formats what came back and returns a [`Response`]. Failures are part of
//! the response: no operation returns `Err`.
//!
//! A call-scoped `host` bypasses the registry entirely and the answer is
//! attributed to that host alone.

mod response;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::info;

pub use response::{HostOrSources, Response, ResponseStatus, setup_guide};

use response::{Rejection, Scope, from_aggregate};

use crate::aggregate::{AggregateResult, Aggregator, Tagged};
use crate::endpoint::{EndpointDescriptor, Resolution, TargetResolver};
use crate::engine::{BackendFuture, EngineBackend, EngineConnect, TimeoutInvoker};
use crate::format::raw::{RawContainer, RawContainerDetail, RawImage, RawImageDetail, RawStats};
use crate::format::{
    ContainerDetail, ContainerStats, ContainerSummary, ImageDetail, ImageSummary, LogSnapshot,
    format_container, format_container_detail, format_image, format_image_detail, format_logs,
    format_stats,
};
use crate::error::ConfigError;
use crate::logging;
use crate::registry::{RegistryFollower, SourceRegistry, SourceSummary};
use crate::session::{ProcessDefaults, SessionConfig, SessionStore};

/// Lines returned by `container_logs` when the caller does not say.
pub const DEFAULT_LOG_TAIL: u32 = 100;

/// Answers read-only queries across the configured sources.
pub struct Inspector {
    store: Arc<SessionStore>,
    registry: Arc<SourceRegistry>,
    aggregator: Aggregator,
    _follower: Option<RegistryFollower>,
}

impl Inspector {
    /// Wrap an existing store and registry.
    ///
    /// The registry is refreshed before every query, so no follower is
    /// needed for session changes made through this inspector.
    #[must_use]
    pub fn new(store: Arc<SessionStore>, registry: Arc<SourceRegistry>) -> Self {
        let aggregator = Aggregator::new(*registry.invoker());
        Self {
            store,
            registry,
            aggregator,
            _follower: None,
        }
    }

    /// Seed a session from `defaults`, build its registry and keep the
    /// registry following session changes.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start(defaults: ProcessDefaults, connector: Arc<dyn EngineConnect>) -> Self {
        let invoker = TimeoutInvoker::new(defaults.call_timeout);
        let store = Arc::new(SessionStore::new(defaults));
        let registry =
            Arc::new(SourceRegistry::build(Arc::clone(&store), connector, invoker).await);
        let follower = registry.follow();
        Self {
            store,
            registry,
            aggregator: Aggregator::new(invoker),
            _follower: Some(follower),
        }
    }

    /// The session store.
    #[must_use]
    pub const fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// The source registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// List containers from every source, each tagged with its source.
    pub async fn list_containers(
        &self,
        all: bool,
        host: Option<&str>,
    ) -> Response<Vec<Tagged<ContainerSummary>>> {
        self.list(
            "list_containers",
            host,
            "containers",
            move |backend| -> BackendFuture<'static, Vec<RawContainer>> {
                Box::pin(async move { backend.list_containers(all).await })
            },
            |raw: Vec<RawContainer>| raw.iter().map(format_container).collect(),
        )
        .await
    }

    /// Inspect a container on the first source that has it.
    pub async fn inspect_container(
        &self,
        id: &str,
        host: Option<&str>,
    ) -> Response<Tagged<ContainerDetail>> {
        let wanted = id.to_owned();
        self.first(
            "inspect_container",
            host,
            &format!("container '{id}'"),
            move |backend| -> BackendFuture<'static, RawContainerDetail> {
                let container = wanted.clone();
                Box::pin(async move { backend.inspect_container(container).await })
            },
            |raw: RawContainerDetail| format_container_detail(&raw),
        )
        .await
    }

    /// The last `tail` log lines of a container, from the first source
    /// that has it.
    pub async fn container_logs(
        &self,
        id: &str,
        tail: u32,
        host: Option<&str>,
    ) -> Response<Tagged<LogSnapshot>> {
        let wanted = id.to_owned();
        self.first(
            "container_logs",
            host,
            &format!("container '{id}'"),
            move |backend| -> BackendFuture<'static, String> {
                let container = wanted.clone();
                Box::pin(async move { backend.container_logs(container, tail).await })
            },
            |text: String| format_logs(id, tail, &text),
        )
        .await
    }

    /// One resource-usage sample for a container.
    pub async fn container_stats(
        &self,
        id: &str,
        host: Option<&str>,
    ) -> Response<Tagged<ContainerStats>> {
        let wanted = id.to_owned();
        self.first(
            "container_stats",
            host,
            &format!("container '{id}'"),
            move |backend| -> BackendFuture<'static, RawStats> {
                let container = wanted.clone();
                Box::pin(async move { backend.container_stats(container).await })
            },
            |raw: RawStats| format_stats(&raw),
        )
        .await
    }

    /// List images from every source, each tagged with its source.
    pub async fn list_images(&self, host: Option<&str>) -> Response<Vec<Tagged<ImageSummary>>> {
        self.list(
            "list_images",
            host,
            "images",
            |backend| -> BackendFuture<'static, Vec<RawImage>> {
                Box::pin(async move { backend.list_images().await })
            },
            |raw: Vec<RawImage>| raw.iter().map(format_image).collect(),
        )
        .await
    }

    /// Inspect an image on the first source that has it.
    pub async fn inspect_image(
        &self,
        id: &str,
        host: Option<&str>,
    ) -> Response<Tagged<ImageDetail>> {
        let wanted = id.to_owned();
        self.first(
            "inspect_image",
            host,
            &format!("image '{id}'"),
            move |backend| -> BackendFuture<'static, RawImageDetail> {
                let image = wanted.clone();
                Box::pin(async move { backend.inspect_image(image).await })
            },
            |raw: RawImageDetail| format_image_detail(&raw),
        )
        .await
    }

    /// The registered sources and their last observed status.
    pub async fn list_sources(&self) -> Response<Vec<SourceSummary>> {
        self.registry.refresh().await;
        let config = self.store.get();
        let summaries = self.summaries();
        let response = if summaries.is_empty() {
            Response::no_source(
                ConfigError::NoTargetConfigured.to_string(),
                HostOrSources::Registered(Vec::new()),
                &config,
            )
        } else {
            Response::success(summaries.clone(), HostOrSources::Registered(summaries))
        };
        audit(&config, "list_sources", None, &response);
        response
    }

    /// Set or clear the session's default target.
    ///
    /// `None` or a blank address clears it. A malformed address leaves the
    /// session unchanged.
    pub async fn configure_target(&self, address: Option<&str>) -> Response<SessionConfig> {
        let parsed = address
            .filter(|value| !value.trim().is_empty())
            .map(EndpointDescriptor::parse)
            .transpose();
        let response = match parsed {
            Ok(target) => {
                let uri = target.as_ref().map(EndpointDescriptor::uri);
                let snapshot = self.store.set_target(target);
                info!(endpoint = uri.as_deref().unwrap_or("none"), "default target configured");
                self.session_response(snapshot).await
            }
            Err(error) => Response::error(
                error.to_string(),
                HostOrSources::Host(address.unwrap_or_default().to_owned()),
            ),
        };
        audit(&self.store.get(), "configure_target", address, &response);
        response
    }

    /// Enable or disable the local engine as a secondary source.
    pub async fn set_secondary_source(&self, allow: bool) -> Response<SessionConfig> {
        let snapshot = self.store.set_secondary_source(allow);
        info!(allow, "secondary source toggled");
        let response = self.session_response(snapshot).await;
        audit(&self.store.get(), "set_secondary_source", None, &response);
        response
    }

    /// The current session configuration.
    pub async fn session_config(&self) -> Response<SessionConfig> {
        let response = self.session_response(self.store.get()).await;
        audit(&self.store.get(), "session_config", None, &response);
        response
    }

    /// Restore the process-start configuration.
    pub async fn reset_session(&self) -> Response<SessionConfig> {
        let snapshot = self.store.reset_to_process_defaults();
        info!("session reset to process defaults");
        let response = self.session_response(snapshot).await;
        audit(&self.store.get(), "reset_session", None, &response);
        response
    }

    async fn session_response(&self, snapshot: SessionConfig) -> Response<SessionConfig> {
        self.registry.refresh().await;
        Response::success(snapshot, HostOrSources::Registered(self.summaries()))
    }

    fn summaries(&self) -> Vec<SourceSummary> {
        self.registry
            .sources()
            .iter()
            .map(|source| source.summary())
            .collect()
    }

    async fn list<R, V, F>(
        &self,
        operation: &'static str,
        host: Option<&str>,
        subject: &str,
        call: F,
        format: impl Fn(R) -> Vec<V>,
    ) -> Response<Vec<Tagged<V>>>
    where
        F: Fn(Arc<dyn EngineBackend>) -> BackendFuture<'static, R>,
    {
        let config = self.store.get();
        let response = match self.dispatch(operation, host, &config, call).await {
            Ok((scope, result)) => {
                from_aggregate(&scope, result.map(format), subject, &config, |formatted| {
                    Some(formatted.into_combined())
                })
            }
            Err(rejection) => rejection.into_response(),
        };
        audit(&config, operation, host, &response);
        response
    }

    async fn first<R, V, F>(
        &self,
        operation: &'static str,
        host: Option<&str>,
        subject: &str,
        call: F,
        format: impl Fn(R) -> V,
    ) -> Response<Tagged<V>>
    where
        F: Fn(Arc<dyn EngineBackend>) -> BackendFuture<'static, R>,
    {
        let config = self.store.get();
        let response = match self.dispatch(operation, host, &config, call).await {
            Ok((scope, result)) => from_aggregate(
                &scope,
                result.map(format),
                subject,
                &config,
                AggregateResult::into_first_ok,
            ),
            Err(rejection) => rejection.into_response(),
        };
        audit(&config, operation, host, &response);
        response
    }

    async fn dispatch<T, F>(
        &self,
        operation: &str,
        host: Option<&str>,
        config: &SessionConfig,
        call: F,
    ) -> Result<(Scope, AggregateResult<T>), Rejection>
    where
        F: Fn(Arc<dyn EngineBackend>) -> BackendFuture<'static, T>,
    {
        let resolution = TargetResolver::resolve(host, config.default_target.as_ref()).map_err(
            |error| Rejection::Address {
                input: host.unwrap_or_default().to_owned(),
                error,
            },
        )?;

        if let Resolution::CallScoped(target) = resolution {
            let source = self
                .registry
                .call_scoped(&target)
                .await
                .map_err(|error| Rejection::Unreachable {
                    target: target.clone(),
                    error,
                })?;
            let result = self.aggregator.query(operation, &[source], call).await;
            return Ok((Scope::CallScoped(target), result));
        }

        self.registry.refresh().await;
        let sources = self.registry.sources();
        let result = self.aggregator.query(operation, &sources, call).await;
        Ok((Scope::Registry, result))
    }
}

fn audit<T>(config: &SessionConfig, operation: &str, host: Option<&str>, response: &Response<T>) {
    if config.audit_enabled {
        logging::audit(operation, host, response.status.as_str());
    }
}
