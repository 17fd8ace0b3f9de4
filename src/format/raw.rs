//! Raw engine records as they arrive on the wire.
//!
//! Field names follow the Docker Engine API JSON, which Podman's compatible
//! API also serves. Every field is optional so partial payloads from either
//! engine decode cleanly; the formatter decides what a missing value means.

use std::collections::HashMap;

use serde::Deserialize;

/// One entry of the container list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawContainer {
    /// Full container ID.
    pub id: String,
    /// Names, each with a leading `/`.
    pub names: Vec<String>,
    /// Image reference the container was created from.
    pub image: String,
    /// Creation time as a Unix timestamp.
    pub created: i64,
    /// Lifecycle state, e.g. `running`.
    pub state: String,
    /// Human-readable status, e.g. `Up 3 hours`.
    pub status: String,
    /// Published ports.
    pub ports: Vec<RawPort>,
}

/// A published port in a container list entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawPort {
    /// Host interface.
    #[serde(rename = "IP")]
    pub ip: Option<String>,
    /// Port inside the container.
    #[serde(rename = "PrivatePort")]
    pub private_port: u16,
    /// Port on the host.
    #[serde(rename = "PublicPort")]
    pub public_port: Option<u16>,
    /// Protocol, e.g. `tcp`.
    #[serde(rename = "Type")]
    pub protocol: String,
}

/// A container inspect record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawContainerDetail {
    /// Full container ID.
    pub id: String,
    /// Name with a leading `/`.
    pub name: String,
    /// Creation time, RFC 3339.
    pub created: Option<String>,
    /// Entrypoint executable.
    pub path: Option<String>,
    /// Entrypoint arguments.
    pub args: Vec<String>,
    /// Runtime state.
    pub state: RawContainerState,
    /// Restart count.
    pub restart_count: i64,
    /// Creation-time configuration.
    pub config: RawContainerConfig,
    /// Network attachments.
    pub network_settings: RawNetworkSettings,
    /// Volume and bind mounts.
    pub mounts: Vec<RawMount>,
}

/// Runtime state of an inspected container.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawContainerState {
    /// Lifecycle state, e.g. `running`.
    pub status: String,
    /// Whether the main process is running.
    pub running: bool,
    /// Exit code of the last run.
    pub exit_code: i64,
    /// When the container last started.
    pub started_at: Option<String>,
    /// When the container last stopped.
    pub finished_at: Option<String>,
    /// Health check result, when configured.
    pub health: Option<RawHealth>,
}

/// Health check state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawHealth {
    /// `healthy`, `unhealthy`, or `starting`.
    pub status: String,
}

/// Configuration an inspected container was created with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawContainerConfig {
    /// Image reference as requested.
    pub image: Option<String>,
    /// Environment in `KEY=value` form.
    pub env: Vec<String>,
    /// Labels.
    pub labels: HashMap<String, String>,
    /// Exposed ports, keyed as `80/tcp`.
    pub exposed_ports: HashMap<String, serde_json::Value>,
}

/// Network settings of an inspected container.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawNetworkSettings {
    /// Attached networks by name.
    pub networks: HashMap<String, RawEndpointSettings>,
}

/// One network attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawEndpointSettings {
    /// Address on this network.
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
}

/// A mount of an inspected container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawMount {
    /// `bind`, `volume`, or `tmpfs`.
    #[serde(rename = "Type")]
    pub kind: String,
    /// Host path or volume name.
    pub source: String,
    /// Path inside the container.
    pub destination: String,
    /// Whether the mount is writable.
    #[serde(rename = "RW")]
    pub rw: bool,
}

/// A single resource-usage sample.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawStats {
    /// Current CPU counters.
    pub cpu_stats: RawCpuStats,
    /// CPU counters from the previous sample.
    pub precpu_stats: RawCpuStats,
    /// Memory counters.
    pub memory_stats: RawMemoryStats,
    /// Per-interface network counters.
    pub networks: HashMap<String, RawNetworkStats>,
    /// Block I/O counters.
    pub blkio_stats: RawBlkioStats,
    /// Process counters.
    pub pids_stats: RawPidsStats,
}

/// CPU counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawCpuStats {
    /// Container CPU usage.
    pub cpu_usage: RawCpuUsage,
    /// Host CPU usage.
    pub system_cpu_usage: Option<u64>,
    /// Number of online CPUs.
    pub online_cpus: Option<u32>,
}

/// Container CPU usage counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawCpuUsage {
    /// Total CPU time consumed, in nanoseconds.
    pub total_usage: u64,
}

/// Memory counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawMemoryStats {
    /// Bytes in use.
    pub usage: Option<u64>,
    /// Limit in bytes.
    pub limit: Option<u64>,
}

/// Network counters for one interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawNetworkStats {
    /// Bytes received.
    pub rx_bytes: u64,
    /// Bytes sent.
    pub tx_bytes: u64,
}

/// Block I/O counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawBlkioStats {
    /// Bytes transferred, split by operation.
    pub io_service_bytes_recursive: Option<Vec<RawBlkioEntry>>,
}

/// One block I/O counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawBlkioEntry {
    /// `read`, `write`, ... (case varies between engines).
    pub op: String,
    /// Bytes.
    pub value: u64,
}

/// Process counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawPidsStats {
    /// Number of processes.
    pub current: Option<u64>,
}

/// One entry of the image list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawImage {
    /// Image ID, usually `sha256:`-prefixed.
    pub id: String,
    /// Repository tags.
    pub repo_tags: Vec<String>,
    /// Creation time as a Unix timestamp.
    pub created: i64,
    /// Size in bytes.
    pub size: i64,
    /// Number of containers using the image, `-1` when not computed.
    pub containers: i64,
}

/// An image inspect record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawImageDetail {
    /// Image ID, usually `sha256:`-prefixed.
    pub id: String,
    /// Repository tags.
    pub repo_tags: Vec<String>,
    /// Creation time, RFC 3339.
    pub created: Option<String>,
    /// CPU architecture.
    pub architecture: String,
    /// Operating system.
    pub os: String,
    /// Size in bytes.
    pub size: i64,
    /// Author.
    pub author: Option<String>,
    /// Default container configuration.
    pub config: RawImageConfig,
    /// Filesystem layers.
    #[serde(rename = "RootFS")]
    pub root_fs: RawRootFs,
}

/// Default container configuration baked into an image.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawImageConfig {
    /// Environment in `KEY=value` form.
    pub env: Vec<String>,
    /// Default command.
    pub cmd: Vec<String>,
    /// Entrypoint.
    pub entrypoint: Vec<String>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// Exposed ports, keyed as `80/tcp`.
    pub exposed_ports: HashMap<String, serde_json::Value>,
}

/// Image filesystem layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawRootFs {
    /// Layer digests.
    pub layers: Vec<String>,
}
