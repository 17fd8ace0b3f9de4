//! Session configuration: the runtime-mutable default target and settings.
//!
//! There is exactly one [`SessionStore`] per process, constructed explicitly
//! from [`ProcessDefaults`] and shared behind an `Arc`. Reads hand out owned
//! [`SessionConfig`] snapshots; writes go through the store's setters, which
//! stamp `set_at`/`set_by` together with the field change and then notify
//! every subscriber with the new snapshot.

mod defaults;
mod store;


use chrono::{DateTime, Utc};
use serde::Serialize;

pub use defaults::ProcessDefaults;
pub use store::{ListenerId, SessionStore};

use crate::config::{LogLevel, SecurityMode};
use crate::endpoint::EndpointDescriptor;
use crate::error::ListenerError;

/// Who made the most recent change to the session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SetBy {
    /// Values taken from the process configuration at start-up.
    ProcessEnv,
    /// Values set through a session call.
    SessionCall,
}

/// An immutable snapshot of the session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Target queried when a call does not name its own.
    pub default_target: Option<EndpointDescriptor>,
    /// Whether the local engine is registered as a secondary source.
    pub allow_secondary_source: bool,
    /// Where the secondary local source lives.
    pub local_socket: EndpointDescriptor,
    /// Request guard strictness.
    pub security_mode: SecurityMode,
    /// Whether exposed operations emit audit events.
    pub audit_enabled: bool,
    /// Diagnostic log level.
    pub log_level: LogLevel,
    /// When the configuration last changed.
    pub set_at: Option<DateTime<Utc>>,
    /// Who made the last change.
    pub set_by: SetBy,
}

impl SessionConfig {
    /// Whether `other` differs in any field that decides which sources exist.
    #[must_use]
    pub fn connectivity_differs(&self, other: &Self) -> bool {
        self.default_target != other.default_target
            || self.allow_secondary_source != other.allow_secondary_source
            || self.local_socket != other.local_socket
    }

    /// Whether any source can be registered from this configuration.
    #[must_use]
    pub const fn has_any_source(&self) -> bool {
        self.default_target.is_some() || self.allow_secondary_source
    }
}

/// A partial update applied by [`SessionStore::set_many`].
///
/// `None` leaves a field untouched. `default_target: Some(None)` clears the
/// default target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    /// New default target, or `Some(None)` to clear it.
    pub default_target: Option<Option<EndpointDescriptor>>,
    /// New secondary source toggle.
    pub allow_secondary_source: Option<bool>,
    /// New request guard strictness.
    pub security_mode: Option<SecurityMode>,
    /// New audit toggle.
    pub audit_enabled: Option<bool>,
    /// New log level.
    pub log_level: Option<LogLevel>,
}

impl SessionUpdate {
    fn apply_to(self, config: &mut SessionConfig) {
        if let Some(target) = self.default_target {
            config.default_target = target;
        }
        if let Some(allow) = self.allow_secondary_source {
            config.allow_secondary_source = allow;
        }
        if let Some(mode) = self.security_mode {
            config.security_mode = mode;
        }
        if let Some(audit) = self.audit_enabled {
            config.audit_enabled = audit;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
    }
}

/// A change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    /// The configuration after the change.
    pub snapshot: SessionConfig,
    /// Whether the set of sources needs rebuilding.
    pub connectivity_changed: bool,
}

/// Receives session configuration changes.
///
/// Listeners run synchronously inside a mutating call and see changes in the
/// order they were written. When writers race, one of them delivers the
/// queued changes for all. A listener that fails or panics is logged and
/// skipped; it never blocks delivery to other listeners and never rolls back
/// the change.
pub trait SessionListener: Send + Sync {
    /// A short name used in diagnostics.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Handle a change.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] if the listener could not process the change.
    fn on_change(&self, change: &ConfigChange) -> Result<(), ListenerError>;
}

impl<F> SessionListener for F
where
    F: Fn(&ConfigChange) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_change(&self, change: &ConfigChange) -> Result<(), ListenerError> {
        self(change)
    }
}
