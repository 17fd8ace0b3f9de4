//! Process-start defaults for the session configuration.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{SessionConfig, SetBy};
use crate::config::{AppConfig, LogLevel, SecurityMode};
use crate::endpoint::EndpointDescriptor;
use crate::error::ConfigError;

/// Values captured from the process configuration at start-up.
///
/// These seed the session store and are what
/// [`SessionStore::reset_to_process_defaults`](super::SessionStore::reset_to_process_defaults)
/// restores. They never change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDefaults {
    /// Default target from `engine_host`.
    pub default_target: Option<EndpointDescriptor>,
    /// Secondary local source toggle.
    pub allow_secondary_source: bool,
    /// Secondary local source socket.
    pub local_socket: EndpointDescriptor,
    /// Request guard strictness.
    pub security_mode: SecurityMode,
    /// Audit toggle.
    pub audit_enabled: bool,
    /// Diagnostic log level.
    pub log_level: LogLevel,
    /// Deadline for each outbound engine call.
    pub call_timeout: Duration,
    /// When the process configuration was captured.
    pub captured_at: DateTime<Utc>,
}

impl ProcessDefaults {
    /// Capture defaults from loaded process configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when `engine_host` or
    /// `sources.local_socket` is not a valid address; the reason includes
    /// the corrected address when one can be suggested.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let default_target = config
            .engine_host
            .as_deref()
            .filter(|host| !host.trim().is_empty())
            .map(|host| parse_field("engine_host", host))
            .transpose()?;
        let local_socket = parse_field("sources.local_socket", &config.sources.local_socket)?;

        Ok(Self {
            default_target,
            allow_secondary_source: config.sources.allow_local,
            local_socket,
            security_mode: config.session.security_mode,
            audit_enabled: config.session.audit_enabled,
            log_level: config.logging.level,
            call_timeout: Duration::from_millis(config.timeouts.call_ms),
            captured_at: Utc::now(),
        })
    }

    /// The session configuration these defaults describe.
    ///
    /// The snapshot is stamped with the capture time so that repeated resets
    /// produce identical snapshots.
    #[must_use]
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            default_target: self.default_target.clone(),
            allow_secondary_source: self.allow_secondary_source,
            local_socket: self.local_socket.clone(),
            security_mode: self.security_mode,
            audit_enabled: self.audit_enabled,
            log_level: self.log_level,
            set_at: Some(self.captured_at),
            set_by: SetBy::ProcessEnv,
        }
    }
}

fn parse_field(field: &str, value: &str) -> Result<EndpointDescriptor, ConfigError> {
    EndpointDescriptor::parse(value).map_err(|error| ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: error.to_string(),
    })
}
