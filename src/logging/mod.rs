//! Diagnostic logging and audit events.
//!
//! Diagnostics go to stderr so that stdout carries only JSON responses.
//! The filter comes from `RUST_LOG` when it is set and parses, otherwise
//! from the configured [`LogLevel`].

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::LogLevel;

/// Target of audit events.
pub const AUDIT_TARGET: &str = "dockscope::audit";

/// Label used in audit events for queries without a call-scoped target.
const CONFIGURED_SOURCES: &str = "configured sources";

/// Build the log filter.
///
/// A blank or unparseable `rust_log` falls back to `level`.
#[must_use]
pub fn filter_for(level: LogLevel, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_directive()))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`TryInitError`] if a global subscriber is already installed.
pub fn init<E: mockable::Env>(level: LogLevel, env: &E) -> Result<(), TryInitError> {
    let filter = filter_for(level, env.string("RUST_LOG").as_deref());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}

/// Emit one audit event for a completed operation.
pub fn audit(operation: &str, host: Option<&str>, status: &str) {
    info!(
        target: AUDIT_TARGET,
        operation,
        host = host.unwrap_or(CONFIGURED_SOURCES),
        status,
        "operation completed"
    );
}
