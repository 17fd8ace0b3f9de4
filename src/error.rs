//! Semantic error types for dockscope.
//!
//! Conditions a caller might inspect, retry, or turn into guidance are
//! modelled as `thiserror` enums. Opaque errors (`eyre::Report`) are reserved
//! for the binary boundary.
//!
//! Per-source failures ([`SourceError`]) never escape the aggregator as
//! errors; they are recorded as data on each query outcome. Only total
//! misconfiguration surfaces as a top-level error status.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during configuration loading and resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// No target could be resolved from the call, the session, or the
    /// secondary source toggle.
    #[error("no container engine target is configured")]
    NoTargetConfigured,

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// A malformed endpoint address.
///
/// The `Missing*` variants are raised when the defect is identifiable and
/// carry a corrected address the caller can offer for confirmation. The
/// suggestion is never applied automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressFormatError {
    /// The address is empty or whitespace-only.
    #[error("address is empty; expected scheme://host:port")]
    Empty,

    /// `host:port` was given without a scheme.
    #[error("address '{input}' is missing a scheme; did you mean '{suggestion}'?")]
    MissingScheme {
        /// The address as supplied.
        input: String,
        /// The corrected address.
        suggestion: String,
    },

    /// `scheme://host` was given without a port.
    #[error("address '{input}' is missing a port; did you mean '{suggestion}'?")]
    MissingPort {
        /// The address as supplied.
        input: String,
        /// The corrected address.
        suggestion: String,
    },

    /// A bare host or IP address was given.
    #[error("address '{input}' is missing a scheme and a port; did you mean '{suggestion}'?")]
    MissingSchemeAndPort {
        /// The address as supplied.
        input: String,
        /// The corrected address.
        suggestion: String,
    },

    /// The scheme is not one the engine connector can speak.
    #[error("unsupported scheme '{scheme}' in address '{input}'; expected tcp, http, unix or npipe")]
    UnsupportedScheme {
        /// The address as supplied.
        input: String,
        /// The offending scheme.
        scheme: String,
    },

    /// The host is neither a valid hostname nor a dotted IPv4 address.
    #[error("invalid host '{host}' in address '{input}'")]
    InvalidHost {
        /// The address as supplied.
        input: String,
        /// The offending host component.
        host: String,
    },

    /// The port is not an integer in 1-65535.
    #[error("invalid port '{port}' in address '{input}'; expected 1-65535")]
    InvalidPort {
        /// The address as supplied.
        input: String,
        /// The offending port component.
        port: String,
    },

    /// Any other structural defect.
    #[error("malformed address '{input}': {reason}")]
    Malformed {
        /// The address as supplied.
        input: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl AddressFormatError {
    /// The corrected address, when the defect could be identified.
    #[must_use]
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::MissingScheme { suggestion, .. }
            | Self::MissingPort { suggestion, .. }
            | Self::MissingSchemeAndPort { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }
}

/// How a per-source failure counts towards aggregate classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// The source could not be reached or did not answer in time.
    Connectivity,
    /// The source answered but the requested entity does not exist there.
    NotFound,
}

/// Errors raised by a single backend source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Failed to connect to the container engine.
    #[error("failed to connect to container engine: {message}")]
    ConnectionFailed {
        /// A description of the connection failure.
        message: String,
    },

    /// The container engine socket was not found.
    #[error("container engine socket not found: {path}")]
    SocketNotFound {
        /// The path where the socket was expected.
        path: PathBuf,
    },

    /// Permission denied when accessing the container engine socket.
    #[error("permission denied accessing container socket: {path}")]
    PermissionDenied {
        /// The path to the socket.
        path: PathBuf,
    },

    /// The engine answered with an error status other than 404.
    #[error("container engine rejected the request (status {status}): {message}")]
    EngineRejected {
        /// The HTTP status code returned by the engine.
        status: u16,
        /// The engine's error message.
        message: String,
    },

    /// The requested entity does not exist on this source.
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// The kind of entity, e.g. `container` or `image`.
        resource: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The engine did not answer within the deadline.
    #[error("{operation} timed out after {elapsed_ms} ms")]
    Timeout {
        /// The name of the operation that timed out.
        operation: String,
        /// The deadline that elapsed, in milliseconds.
        elapsed_ms: u64,
    },

    /// The engine answered with a payload that could not be read.
    #[error("unexpected payload from container engine: {message}")]
    Payload {
        /// A description of the decoding failure.
        message: String,
    },
}

impl SourceError {
    /// Classify the failure for aggregate status computation.
    ///
    /// Timeouts count as connectivity failures.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::NotFound { .. } => FailureClass::NotFound,
            _ => FailureClass::Connectivity,
        }
    }
}

/// A session listener rejected a change notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session listener '{listener}' failed: {message}")]
pub struct ListenerError {
    /// The listener's name.
    pub listener: String,
    /// A description of the failure.
    pub message: String,
}

/// Top-level error type for dockscope.
#[derive(Debug, Error)]
pub enum DockscopeError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A backend source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A response could not be rendered for output.
    #[error("failed to render response: {message}")]
    Output {
        /// A description of the failure.
        message: String,
    },

    /// The async runtime could not be created.
    #[error("failed to create async runtime: {message}")]
    RuntimeCreationFailed {
        /// A description of the failure.
        message: String,
    },
}

/// A specialised `Result` type for dockscope operations.
pub type Result<T> = std::result::Result<T, DockscopeError>;
