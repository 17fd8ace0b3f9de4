//! The process-wide session configuration store.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{ConfigChange, ProcessDefaults, SessionConfig, SessionListener, SessionUpdate, SetBy};
use crate::endpoint::EndpointDescriptor;

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerEntry = (ListenerId, Arc<dyn SessionListener>);

/// Holds the live session configuration.
///
/// Construct once per process and share with `Arc`. All writers go through
/// the setters below; readers receive owned snapshots.
pub struct SessionStore {
    defaults: ProcessDefaults,
    state: RwLock<SessionConfig>,
    listeners: Mutex<Vec<ListenerEntry>>,
    next_listener: AtomicU64,
    changes: watch::Sender<SessionConfig>,
    pending: Mutex<VecDeque<ConfigChange>>,
    delivering: Mutex<()>,
}

impl SessionStore {
    /// Create a store seeded from process defaults.
    #[must_use]
    pub fn new(defaults: ProcessDefaults) -> Self {
        let initial = defaults.to_session_config();
        let (changes, _) = watch::channel(initial.clone());
        Self {
            defaults,
            state: RwLock::new(initial),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            changes,
            pending: Mutex::new(VecDeque::new()),
            delivering: Mutex::new(()),
        }
    }

    /// The defaults this store was created with.
    #[must_use]
    pub const fn process_defaults(&self) -> &ProcessDefaults {
        &self.defaults
    }

    /// A snapshot of the current configuration.
    #[must_use]
    pub fn get(&self) -> SessionConfig {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace or clear the default target.
    pub fn set_target(&self, target: Option<EndpointDescriptor>) -> SessionConfig {
        self.set_many(SessionUpdate {
            default_target: Some(target),
            ..SessionUpdate::default()
        })
    }

    /// Toggle the secondary local source.
    pub fn set_secondary_source(&self, allow: bool) -> SessionConfig {
        self.set_many(SessionUpdate {
            allow_secondary_source: Some(allow),
            ..SessionUpdate::default()
        })
    }

    /// Apply a partial update in one step.
    pub fn set_many(&self, update: SessionUpdate) -> SessionConfig {
        self.mutate(SetBy::SessionCall, |config| {
            update.apply_to(config);
            config.set_at = Some(Utc::now());
        })
    }

    /// Rebuild the configuration from process defaults.
    pub fn reset_to_process_defaults(&self) -> SessionConfig {
        let defaults = self.defaults.to_session_config();
        self.mutate(SetBy::ProcessEnv, move |config| *config = defaults)
    }

    /// Register a listener. It receives every subsequent change.
    pub fn subscribe(&self, listener: Arc<dyn SessionListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// A channel that always holds the latest snapshot.
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<SessionConfig> {
        self.changes.subscribe()
    }

    fn mutate<F>(&self, set_by: SetBy, apply: F) -> SessionConfig
    where
        F: FnOnce(&mut SessionConfig),
    {
        let change = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let before = state.clone();
            apply(&mut *state);
            state.set_by = set_by;
            let next = ConfigChange {
                connectivity_changed: before.connectivity_differs(&*state),
                snapshot: state.clone(),
            };
            // Publish and enqueue under the write lock so both follow write order.
            self.changes.send_replace(next.snapshot.clone());
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(next.clone());
            next
        };

        let target = change
            .snapshot
            .default_target
            .as_ref()
            .map(EndpointDescriptor::uri);
        info!(
            set_by = ?change.snapshot.set_by,
            connectivity_changed = change.connectivity_changed,
            default_target = target.as_deref(),
            "session configuration updated"
        );

        self.deliver_pending();
        change.snapshot
    }

    /// Deliver queued changes in order.
    ///
    /// One thread delivers at a time. A writer that finds delivery in
    /// progress leaves its change queued for the active deliverer, which
    /// checks the queue again after releasing the delivery lock. Changes
    /// made by a listener during delivery are delivered after the current
    /// one.
    fn deliver_pending(&self) {
        loop {
            {
                let Some(_delivering) = self.try_deliver_lock() else {
                    return;
                };
                while let Some(change) = self.next_pending() {
                    self.notify(&change);
                }
            }
            if self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
            {
                return;
            }
        }
    }

    fn try_deliver_lock(&self) -> Option<MutexGuard<'_, ()>> {
        match self.delivering.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    fn next_pending(&self) -> Option<ConfigChange> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn notify(&self, change: &ConfigChange) {
        // Listeners run without the state lock so they may call back into the store.
        let listeners: Vec<ListenerEntry> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (_, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_change(change))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(%error, "session listener failed"),
                Err(_) => warn!(listener = listener.name(), "session listener panicked"),
            }
        }
    }
}
