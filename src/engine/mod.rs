//! Container engine access.
//!
//! Every source is an [`EngineBackend`] built by an [`EngineConnect`]
//! implementation. Remote sources come from an endpoint descriptor; the
//! local source comes from a closed [`LocalConnectionConfig`]. All outbound
//! calls run under a [`TimeoutInvoker`] deadline.

mod backend;
mod connection;
mod error_classification;
mod invoker;

#[cfg(test)]
pub(crate) mod mocks;

pub use backend::{BackendFuture, DockerBackend, EngineBackend};
pub use connection::{EngineConnect, EngineConnector, LocalConnectionConfig, probe};
pub use invoker::{DEFAULT_CALL_DEADLINE, TimeoutInvoker};
