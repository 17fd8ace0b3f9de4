//! The read-only engine surface shared by every source.
//!
//! Each source holds an [`EngineBackend`]. The production implementation,
//! [`DockerBackend`], speaks the Docker Engine API through Bollard, which
//! also covers Podman's compatible API. Responses are reshaped into the raw
//! records in [`crate::format::raw`] so the rest of the crate never depends
//! on Bollard's model types.

use std::future::Future;
use std::pin::Pin;

use bollard::Docker;
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptionsBuilder, ListImagesOptionsBuilder,
    LogsOptionsBuilder, StatsOptionsBuilder,
};
use futures_util::{StreamExt, TryStreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error_classification::{Subject, classify_request_error};
use crate::error::SourceError;
use crate::format::raw::{RawContainer, RawContainerDetail, RawImage, RawImageDetail, RawStats};

/// Future returned by [`EngineBackend`] methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Read-only operations a container engine source must answer.
pub trait EngineBackend: Send + Sync {
    /// Check that the engine responds.
    fn ping(&self) -> BackendFuture<'_, ()>;

    /// List containers; stopped ones only when `all` is set.
    fn list_containers(&self, all: bool) -> BackendFuture<'_, Vec<RawContainer>>;

    /// Inspect one container by ID or name.
    fn inspect_container(&self, id: String) -> BackendFuture<'_, RawContainerDetail>;

    /// Fetch the last `tail` lines of a container's combined output.
    fn container_logs(&self, id: String, tail: u32) -> BackendFuture<'_, String>;

    /// Take one resource-usage sample.
    fn container_stats(&self, id: String) -> BackendFuture<'_, RawStats>;

    /// List images.
    fn list_images(&self) -> BackendFuture<'_, Vec<RawImage>>;

    /// Inspect one image by ID or reference.
    fn inspect_image(&self, id: String) -> BackendFuture<'_, RawImageDetail>;
}

/// An [`EngineBackend`] backed by a Bollard client.
#[derive(Debug, Clone)]
pub struct DockerBackend {
    docker: Docker,
    endpoint: String,
}

impl DockerBackend {
    /// Wrap a connected client. `endpoint` is the URI it was connected to and
    /// is used to attach socket paths to errors.
    #[must_use]
    pub fn new(docker: Docker, endpoint: impl Into<String>) -> Self {
        Self {
            docker,
            endpoint: endpoint.into(),
        }
    }

    fn classify(&self, error: &bollard::errors::Error, subject: Option<Subject<'_>>) -> SourceError {
        classify_request_error(error, &self.endpoint, subject)
    }
}

impl EngineBackend for DockerBackend {
    fn ping(&self) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            self.docker
                .ping()
                .await
                .map(|_| ())
                .map_err(|error| self.classify(&error, None))
        })
    }

    fn list_containers(&self, all: bool) -> BackendFuture<'_, Vec<RawContainer>> {
        Box::pin(async move {
            let options = ListContainersOptionsBuilder::new().all(all).build();
            let summaries = self
                .docker
                .list_containers(Some(options))
                .await
                .map_err(|error| self.classify(&error, None))?;
            reshape(&summaries)
        })
    }

    fn inspect_container(&self, id: String) -> BackendFuture<'_, RawContainerDetail> {
        Box::pin(async move {
            let subject = Subject {
                resource: "container",
                id: &id,
            };
            let detail = self
                .docker
                .inspect_container(&id, None::<InspectContainerOptions>)
                .await
                .map_err(|error| self.classify(&error, Some(subject)))?;
            reshape(&detail)
        })
    }

    fn container_logs(&self, id: String, tail: u32) -> BackendFuture<'_, String> {
        Box::pin(async move {
            let subject = Subject {
                resource: "container",
                id: &id,
            };
            let options = LogsOptionsBuilder::new()
                .stdout(true)
                .stderr(true)
                .follow(false)
                .timestamps(true)
                .tail(&tail.to_string())
                .build();
            let chunks: Vec<bollard::container::LogOutput> = self
                .docker
                .logs(&id, Some(options))
                .try_collect()
                .await
                .map_err(|error| self.classify(&error, Some(subject)))?;

            let mut text = String::new();
            for chunk in chunks {
                text.push_str(&String::from_utf8_lossy(&chunk.into_bytes()));
            }
            Ok(text)
        })
    }

    fn container_stats(&self, id: String) -> BackendFuture<'_, RawStats> {
        Box::pin(async move {
            let subject = Subject {
                resource: "container",
                id: &id,
            };
            // A non-streaming request still waits for a second sample, so
            // `precpu_stats` is populated.
            let options = StatsOptionsBuilder::new().stream(false).one_shot(false).build();
            let mut stream = std::pin::pin!(self.docker.stats(&id, Some(options)));
            let sample = stream
                .next()
                .await
                .ok_or_else(|| SourceError::Payload {
                    message: format!("engine returned no stats sample for '{id}'"),
                })?
                .map_err(|error| self.classify(&error, Some(subject)))?;
            reshape(&sample)
        })
    }

    fn list_images(&self) -> BackendFuture<'_, Vec<RawImage>> {
        Box::pin(async move {
            let options = ListImagesOptionsBuilder::new().all(false).build();
            let images = self
                .docker
                .list_images(Some(options))
                .await
                .map_err(|error| self.classify(&error, None))?;
            reshape(&images)
        })
    }

    fn inspect_image(&self, id: String) -> BackendFuture<'_, RawImageDetail> {
        Box::pin(async move {
            let subject = Subject {
                resource: "image",
                id: &id,
            };
            let detail = self
                .docker
                .inspect_image(&id)
                .await
                .map_err(|error| self.classify(&error, Some(subject)))?;
            reshape(&detail)
        })
    }
}

/// Re-read a Bollard model as one of our raw records via its wire JSON.
fn reshape<M, R>(model: &M) -> Result<R, SourceError>
where
    M: Serialize,
    R: DeserializeOwned,
{
    serde_json::to_value(model)
        .and_then(serde_json::from_value)
        .map_err(|error| SourceError::Payload {
            message: error.to_string(),
        })
}
