//! Read-only introspection across one or more container engines.
//!
//! `dockscope` answers questions about containers and images by querying
//! every configured engine at once and merging the answers. A session holds
//! a default target (a remote engine addressed as `scheme://host:port`) and
//! an optional secondary source (the local engine socket). Any single query
//! may instead name its own target, which bypasses the configured sources.
//!
//! Per-source failures never abort a query: each source's outcome is kept
//! as data and the combined answer is classified as success, partial, not
//! found everywhere, or no usable source at all. The last case comes with
//! setup guidance rather than a bare error.
//!
//! # Modules
//!
//! - [`api`]: Operations exposed to the calling agent
//! - [`aggregate`]: Concurrent fan-out and status classification
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`endpoint`]: Endpoint descriptors and per-call target resolution
//! - [`engine`]: The read-only engine seam, connector and call deadline
//! - [`error`]: Semantic error types for the application
//! - [`format`]: Reduction of engine records to display shapes
//! - [`logging`]: Diagnostic subscriber and audit events
//! - [`registry`]: The live set of sources derived from the session
//! - [`session`]: The mutable session configuration store

pub mod aggregate;
pub mod api;
pub mod config;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod format;
pub mod logging;
pub mod registry;
pub mod session;
