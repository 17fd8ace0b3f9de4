//! Mock engine seams shared by unit tests across the crate.

use std::sync::Arc;

use mockall::mock;

use super::{BackendFuture, EngineBackend, EngineConnect, LocalConnectionConfig};
use crate::endpoint::EndpointDescriptor;
use crate::error::SourceError;
use crate::format::raw::{RawContainer, RawContainerDetail, RawImage, RawImageDetail, RawStats};

mock! {
    #[derive(Debug)]
    pub(crate) Backend {}

    impl EngineBackend for Backend {
        fn ping<'a>(&'a self) -> BackendFuture<'a, ()>;
        fn list_containers<'a>(&'a self, all: bool) -> BackendFuture<'a, Vec<RawContainer>>;
        fn inspect_container<'a>(&'a self, id: String) -> BackendFuture<'a, RawContainerDetail>;
        fn container_logs<'a>(&'a self, id: String, tail: u32) -> BackendFuture<'a, String>;
        fn container_stats<'a>(&'a self, id: String) -> BackendFuture<'a, RawStats>;
        fn list_images<'a>(&'a self) -> BackendFuture<'a, Vec<RawImage>>;
        fn inspect_image<'a>(&'a self, id: String) -> BackendFuture<'a, RawImageDetail>;
    }
}

mock! {
    #[derive(Debug)]
    pub(crate) Connector {}

    impl EngineConnect for Connector {
        fn connect_remote(
            &self,
            descriptor: &EndpointDescriptor,
        ) -> Result<Arc<dyn EngineBackend>, SourceError>;
        fn connect_local(
            &self,
            config: &LocalConnectionConfig,
        ) -> Result<Arc<dyn EngineBackend>, SourceError>;
    }
}

/// A backend whose ping answers with `result`.
pub(crate) fn pinging_backend(result: Result<(), SourceError>) -> MockBackend {
    let mut backend = MockBackend::new();
    backend
        .expect_ping()
        .returning(move || {
            let response = result.clone();
            Box::pin(async move { response })
        });
    backend
}

/// A backend whose ping never completes.
pub(crate) fn hanging_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend
        .expect_ping()
        .returning(|| Box::pin(std::future::pending::<Result<(), SourceError>>()));
    backend
}
