//! The set of live sources derived from the session configuration.
//!
//! Remote sources are registered optimistically: a client is built from the
//! descriptor and reachability is discovered by the first real query. The
//! local source is registered only after a successful ping through its
//! explicit socket; if the probe fails it is left out entirely.
//!
//! A rebuild assembles a complete new source list and then swaps it in with
//! a single pointer replacement, so readers see either the old list or the
//! new one and never a mixture.

mod source;


use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use source::{Source, SourceKind, SourceStatus, SourceSummary};

use crate::endpoint::{EndpointDescriptor, Transport};
use crate::engine::{EngineBackend, EngineConnect, LocalConnectionConfig, TimeoutInvoker, probe};
use crate::error::{ListenerError, SourceError};
use crate::session::{ConfigChange, ListenerId, SessionConfig, SessionListener, SessionStore};

const REMOTE_LABEL: &str = "remote";
const LOCAL_LABEL: &str = "local";
const SECONDARY_LABEL: &str = "secondary";

struct RegistryState {
    sources: Vec<Arc<Source>>,
    built_from: Option<SessionConfig>,
}

/// Owns the current sources and rebuilds them when connectivity changes.
pub struct SourceRegistry {
    store: Arc<SessionStore>,
    connector: Arc<dyn EngineConnect>,
    invoker: TimeoutInvoker,
    state: RwLock<Arc<RegistryState>>,
    rebuild_lock: Mutex<()>,
}

impl SourceRegistry {
    /// Create an empty registry. Call [`Self::rebuild`] or
    /// [`Self::refresh`] to populate it.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        connector: Arc<dyn EngineConnect>,
        invoker: TimeoutInvoker,
    ) -> Self {
        Self {
            store,
            connector,
            invoker,
            state: RwLock::new(Arc::new(RegistryState {
                sources: Vec::new(),
                built_from: None,
            })),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Create a registry populated from the store's current snapshot.
    pub async fn build(
        store: Arc<SessionStore>,
        connector: Arc<dyn EngineConnect>,
        invoker: TimeoutInvoker,
    ) -> Self {
        let registry = Self::new(store, connector, invoker);
        registry.rebuild().await;
        registry
    }

    /// The current sources, in registration order.
    #[must_use]
    pub fn sources(&self) -> Vec<Arc<Source>> {
        self.current().sources.clone()
    }

    /// The deadline applied to every engine call made for these sources.
    #[must_use]
    pub const fn invoker(&self) -> &TimeoutInvoker {
        &self.invoker
    }

    /// Discard every source and assemble a fresh set from the latest
    /// configuration. Returns the number of sources registered.
    pub async fn rebuild(&self) -> usize {
        let _guard = self.rebuild_lock.lock().await;
        self.rebuild_locked().await
    }

    /// Rebuild only if the configuration's connectivity fields changed since
    /// the last build. Returns whether a rebuild happened.
    pub async fn refresh(&self) -> bool {
        let _guard = self.rebuild_lock.lock().await;
        let latest = self.store.get();
        let stale = self
            .current()
            .built_from
            .as_ref()
            .is_none_or(|built| built.connectivity_differs(&latest));
        if stale {
            self.rebuild_locked().await;
        }
        stale
    }

    /// Build a one-off source for a call-scoped target.
    ///
    /// The source is not registered. Remote targets are not probed; a local
    /// target must answer a ping.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the client cannot be built or a local
    /// target does not answer.
    pub async fn call_scoped(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> Result<Arc<Source>, SourceError> {
        let backend = self.connect(descriptor).await?;
        Ok(Arc::new(Source::new(
            primary_label(descriptor),
            descriptor.clone(),
            backend,
        )))
    }

    /// Rebuild automatically whenever the store reports a connectivity
    /// change. Dropping the returned guard stops following.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use = "dropping the follower stops automatic rebuilds"]
    pub fn follow(self: &Arc<Self>) -> RegistryFollower {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let listener = self.store.subscribe(Arc::new(RebuildTrigger { sender }));
        let registry = Arc::clone(self);
        let task = tokio::spawn(async move {
            while receiver.recv().await.is_some() {
                // Coalesce bursts of changes into one refresh.
                while receiver.try_recv().is_ok() {}
                registry.refresh().await;
            }
        });

        RegistryFollower {
            store: Arc::clone(&self.store),
            listener,
            task,
        }
    }

    fn current(&self) -> Arc<RegistryState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    async fn rebuild_locked(&self) -> usize {
        let config = self.store.get();
        let sources = self.assemble(&config).await;
        let count = sources.len();
        let labels: Vec<&str> = sources.iter().map(|source| source.label()).collect();
        info!(count, ?labels, "source registry rebuilt");

        let next = Arc::new(RegistryState {
            sources,
            built_from: Some(config),
        });
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
        count
    }

    async fn assemble(&self, config: &SessionConfig) -> Vec<Arc<Source>> {
        let mut sources: Vec<Arc<Source>> = Vec::new();
        if !config.has_any_source() {
            debug!("no default target and no secondary source configured");
            return sources;
        }

        if let Some(target) = &config.default_target {
            match self.connect(target).await {
                Ok(backend) => sources.push(Arc::new(Source::new(
                    primary_label(target),
                    target.clone(),
                    backend,
                ))),
                Err(error) => warn!(endpoint = %target, %error, "default target not registered"),
            }
        }

        if config.allow_secondary_source {
            let socket = &config.local_socket;
            if sources.iter().any(|source| source.descriptor() == socket) {
                debug!(socket = %socket, "local socket already registered as default target");
            } else {
                match self.connect(socket).await {
                    Ok(backend) => {
                        let label = if sources.iter().any(|source| source.label() == LOCAL_LABEL) {
                            SECONDARY_LABEL
                        } else {
                            LOCAL_LABEL
                        };
                        sources.push(Arc::new(Source::new(label, socket.clone(), backend)));
                    }
                    Err(error) => {
                        warn!(socket = %socket, %error, "local engine not available; omitting");
                    }
                }
            }
        }

        sources
    }

    async fn connect(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> Result<Arc<dyn EngineBackend>, SourceError> {
        match descriptor.transport() {
            Transport::Remote => self.connector.connect_remote(descriptor),
            Transport::Local => {
                let config = LocalConnectionConfig::new(descriptor.clone(), self.invoker.deadline())?;
                let backend = self.connector.connect_local(&config)?;
                probe(backend.as_ref(), &self.invoker).await?;
                Ok(backend)
            }
        }
    }
}

const fn primary_label(descriptor: &EndpointDescriptor) -> &'static str {
    match descriptor.transport() {
        Transport::Remote => REMOTE_LABEL,
        Transport::Local => LOCAL_LABEL,
    }
}

struct RebuildTrigger {
    sender: mpsc::UnboundedSender<()>,
}

impl SessionListener for RebuildTrigger {
    fn name(&self) -> &str {
        "source-registry"
    }

    fn on_change(&self, change: &ConfigChange) -> Result<(), ListenerError> {
        if !change.connectivity_changed {
            return Ok(());
        }
        self.sender.send(()).map_err(|_| ListenerError {
            listener: String::from("source-registry"),
            message: String::from("rebuild task has stopped"),
        })
    }
}

/// Keeps a registry following its store. Dropping it unsubscribes and
/// stops the rebuild task.
pub struct RegistryFollower {
    store: Arc<SessionStore>,
    listener: ListenerId,
    task: JoinHandle<()>,
}

impl Drop for RegistryFollower {
    fn drop(&mut self) {
        if !self.store.unsubscribe(self.listener) {
            debug!("registry follower was already unsubscribed");
        }
        self.task.abort();
    }
}
