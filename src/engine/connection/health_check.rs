//! Engine health probing.

use tracing::debug;

use crate::engine::{EngineBackend, TimeoutInvoker};
use crate::error::SourceError;

/// Ping an engine under the invoker's deadline.
///
/// This confirms the engine is operational, not just that a client could
/// be built for it.
///
/// # Errors
///
/// Returns the classified ping failure, or [`SourceError::Timeout`] if the
/// engine did not answer in time.
pub async fn probe(backend: &dyn EngineBackend, invoker: &TimeoutInvoker) -> Result<(), SourceError> {
    let result = invoker.invoke("ping", backend.ping()).await;
    if let Err(error) = &result {
        debug!(%error, "engine probe failed");
    }
    result
}
