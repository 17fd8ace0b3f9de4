//! Container engine connection.
//!
//! Remote endpoints are reached over HTTP (`tcp://` is rewritten to
//! `http://` for Bollard). Local endpoints are reached through an explicit
//! Unix socket or named pipe described by a [`LocalConnectionConfig`]; the
//! connector never consults `DOCKER_HOST` or any other ambient setting.

mod health_check;


use std::sync::Arc;
use std::time::Duration;

use bollard::Docker;
use tracing::debug;

pub use health_check::probe;

use super::backend::{DockerBackend, EngineBackend};
use super::error_classification::classify_request_error;
use crate::endpoint::{EndpointDescriptor, Transport};
use crate::error::SourceError;

/// Client-level request ceiling in seconds. Per-call deadlines are enforced
/// separately by the invoker and are normally much shorter.
const CONNECTION_TIMEOUT_SECS: u64 = 120;

/// Everything needed to reach the local engine, and nothing else.
///
/// The only way to build one is [`LocalConnectionConfig::new`], which
/// requires a local descriptor, so a local connection cannot silently pick
/// up ambient client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConnectionConfig {
    socket: EndpointDescriptor,
    timeout: Duration,
}

impl LocalConnectionConfig {
    /// Describe a local connection.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ConnectionFailed`] if `socket` is a remote
    /// descriptor.
    pub fn new(socket: EndpointDescriptor, timeout: Duration) -> Result<Self, SourceError> {
        if socket.transport() != Transport::Local {
            return Err(SourceError::ConnectionFailed {
                message: format!("'{socket}' is not a local socket"),
            });
        }
        Ok(Self { socket, timeout })
    }

    /// The socket to connect to.
    #[must_use]
    pub const fn socket(&self) -> &EndpointDescriptor {
        &self.socket
    }

    /// The client-level request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builds engine clients for sources.
///
/// Connecting only constructs a client; it does not contact the engine.
/// Callers decide whether to probe with [`probe`].
pub trait EngineConnect: Send + Sync {
    /// Build a client for a remote descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the descriptor is not remote or the client
    /// cannot be constructed.
    fn connect_remote(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> Result<Arc<dyn EngineBackend>, SourceError>;

    /// Build a client for the local engine.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the client cannot be constructed.
    fn connect_local(
        &self,
        config: &LocalConnectionConfig,
    ) -> Result<Arc<dyn EngineBackend>, SourceError>;
}

/// Connects to Docker or Podman engines through Bollard.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConnector;

impl EngineConnector {
    /// The URI Bollard should be given for a remote descriptor.
    ///
    /// `tcp://` is rewritten to `http://`; `http://` passes through.
    #[must_use]
    pub fn http_uri(descriptor: &EndpointDescriptor) -> String {
        let uri = descriptor.uri();
        if descriptor.scheme() == "tcp" {
            uri.replacen("tcp://", "http://", 1)
        } else {
            uri
        }
    }
}

impl EngineConnect for EngineConnector {
    fn connect_remote(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> Result<Arc<dyn EngineBackend>, SourceError> {
        if !descriptor.is_remote() {
            return Err(SourceError::ConnectionFailed {
                message: format!("'{descriptor}' is not a remote address"),
            });
        }
        let uri = Self::http_uri(descriptor);
        debug!(endpoint = %descriptor, "building remote engine client");
        let docker =
            Docker::connect_with_http(&uri, CONNECTION_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
                .map_err(|error| classify_request_error(&error, &uri, None))?;
        Ok(Arc::new(DockerBackend::new(docker, descriptor.uri())))
    }

    fn connect_local(
        &self,
        config: &LocalConnectionConfig,
    ) -> Result<Arc<dyn EngineBackend>, SourceError> {
        let uri = config.socket().uri();
        let timeout_secs = config.timeout().as_secs().max(1);
        debug!(socket = %uri, "building local engine client");
        let docker = Docker::connect_with_socket(&uri, timeout_secs, bollard::API_DEFAULT_VERSION)
            .map_err(|error| classify_request_error(&error, &uri, None))?;
        Ok(Arc::new(DockerBackend::new(docker, uri)))
    }
}
