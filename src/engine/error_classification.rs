//! Error classification helpers for container engine failures.
//!
//! This module converts low-level `Bollard` errors into semantic
//! `SourceError` variants so the aggregator can tell an unreachable engine
//! apart from a resource that simply does not exist there.

use std::path::Path;

use crate::error::SourceError;

const NOT_FOUND_STATUS: u16 = 404;

/// The resource a request addressed, used to build not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Subject<'a> {
    pub(crate) resource: &'a str,
    pub(crate) id: &'a str,
}

/// Extract the filesystem path from a socket URI.
///
/// Strips the scheme prefix (`unix://`, `npipe://`) to get the raw path.
/// HTTP endpoints have no filesystem path and return `None`.
pub(crate) fn extract_socket_path(socket_uri: &str) -> Option<&Path> {
    socket_uri
        .strip_prefix("unix://")
        .or_else(|| socket_uri.strip_prefix("npipe://"))
        .map(Path::new)
}

fn classify_io_error_kind(
    kind: std::io::ErrorKind,
    socket_path: Option<&Path>,
    error_msg: &str,
) -> SourceError {
    let connection_failed = || SourceError::ConnectionFailed {
        message: error_msg.to_owned(),
    };
    match kind {
        std::io::ErrorKind::PermissionDenied => socket_path.map_or_else(connection_failed, |path| {
            SourceError::PermissionDenied {
                path: path.to_path_buf(),
            }
        }),
        std::io::ErrorKind::NotFound => socket_path.map_or_else(connection_failed, |path| {
            SourceError::SocketNotFound {
                path: path.to_path_buf(),
            }
        }),
        _ => connection_failed(),
    }
}

/// Classify a `Bollard` error into a semantic `SourceError`.
///
/// A 404 from the engine becomes [`SourceError::NotFound`] when the request
/// addressed a specific resource. Socket and I/O failures keep the socket
/// path when one is known. Everything else is a connectivity failure.
pub(crate) fn classify_request_error(
    bollard_error: &bollard::errors::Error,
    socket_uri: &str,
    subject: Option<Subject<'_>>,
) -> SourceError {
    let socket_path = extract_socket_path(socket_uri);
    let error_msg = bollard_error.to_string();

    match bollard_error {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => {
            return match subject {
                Some(Subject { resource, id }) if *status_code == NOT_FOUND_STATUS => {
                    SourceError::NotFound {
                        resource: resource.to_owned(),
                        id: id.to_owned(),
                    }
                }
                _ => SourceError::EngineRejected {
                    status: *status_code,
                    message: message.clone(),
                },
            };
        }
        bollard::errors::Error::SocketNotFoundError(_) => {
            if let Some(path) = socket_path {
                return SourceError::SocketNotFound {
                    path: path.to_path_buf(),
                };
            }
        }
        bollard::errors::Error::IOError { err } => {
            let kind = io_error_kind_in_chain(err).unwrap_or_else(|| err.kind());
            return classify_io_error_kind(kind, socket_path, &error_msg);
        }
        _ => {}
    }

    if let Some(kind) = io_error_kind_in_chain(bollard_error) {
        return classify_io_error_kind(kind, socket_path, &error_msg);
    }

    SourceError::ConnectionFailed { message: error_msg }
}

/// Walk the error source chain looking for an `io::Error` kind.
fn io_error_kind_in_chain(error: &dyn std::error::Error) -> Option<std::io::ErrorKind> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = error.source();
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            return Some(io_err.kind());
        }
        current = err.source();
    }
    None
}
