//! Canonical result shapes and the pure functions that produce them.
//!
//! Backends hand back [`raw`] records in the engine's wire vocabulary. The
//! functions here reduce those to the fields an inspecting caller needs:
//! short identifiers, human-scaled byte counts, and percentages computed
//! from counter deltas. Nothing here performs I/O.

pub mod raw;


use std::collections::BTreeMap;

use chrono::DateTime;
use serde::Serialize;

use raw::{
    RawContainer, RawContainerDetail, RawCpuStats, RawImage, RawImageDetail, RawPort, RawStats,
};

/// Length identifiers are truncated to for display.
pub const SHORT_ID_LEN: usize = 12;

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// A container as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    /// Short container ID.
    pub id: String,
    /// Primary name without the leading `/`.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Lifecycle state.
    pub state: String,
    /// Human-readable status.
    pub status: String,
    /// Creation time, RFC 3339.
    pub created: Option<String>,
    /// Published ports, e.g. `0.0.0.0:8080->80/tcp`.
    pub ports: Vec<String>,
}

/// A mount in a container detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountSummary {
    /// `bind`, `volume`, or `tmpfs`.
    pub kind: String,
    /// Host path or volume name.
    pub source: String,
    /// Path inside the container.
    pub destination: String,
    /// Whether the mount is read-only.
    pub read_only: bool,
}

/// A container's full detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDetail {
    /// Short container ID.
    pub id: String,
    /// Name without the leading `/`.
    pub name: String,
    /// Image reference as requested.
    pub image: String,
    /// Creation time.
    pub created: Option<String>,
    /// Lifecycle state.
    pub status: String,
    /// Whether the main process is running.
    pub running: bool,
    /// Exit code of the last run.
    pub exit_code: i64,
    /// When the container last started.
    pub started_at: Option<String>,
    /// When the container last stopped.
    pub finished_at: Option<String>,
    /// Health check status, when configured.
    pub health: Option<String>,
    /// Restart count.
    pub restart_count: i64,
    /// Entrypoint and arguments.
    pub command: Option<String>,
    /// Environment in `KEY=value` form.
    pub env: Vec<String>,
    /// Labels.
    pub labels: BTreeMap<String, String>,
    /// Mounts.
    pub mounts: Vec<MountSummary>,
    /// Address on each attached network.
    pub networks: BTreeMap<String, String>,
    /// Exposed ports, sorted.
    pub exposed_ports: Vec<String>,
}

/// One resource-usage sample, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStats {
    /// CPU usage as a percentage of host capacity.
    pub cpu_percent: f64,
    /// Memory in use.
    pub memory_usage: String,
    /// Memory limit.
    pub memory_limit: String,
    /// Memory in use as a percentage of the limit.
    pub memory_percent: f64,
    /// Bytes received over all interfaces.
    pub network_rx: String,
    /// Bytes sent over all interfaces.
    pub network_tx: String,
    /// Bytes read from block devices.
    pub block_read: String,
    /// Bytes written to block devices.
    pub block_write: String,
    /// Number of processes.
    pub pids: u64,
}

/// An image as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    /// Short image ID.
    pub id: String,
    /// Repository tags.
    pub tags: Vec<String>,
    /// Creation time, RFC 3339.
    pub created: Option<String>,
    /// Human-scaled size.
    pub size: String,
    /// Containers using the image, when the engine computed it.
    pub containers: Option<i64>,
}

/// An image's full detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDetail {
    /// Short image ID.
    pub id: String,
    /// Repository tags.
    pub tags: Vec<String>,
    /// Creation time.
    pub created: Option<String>,
    /// CPU architecture.
    pub architecture: String,
    /// Operating system.
    pub os: String,
    /// Human-scaled size.
    pub size: String,
    /// Author.
    pub author: Option<String>,
    /// Default environment.
    pub env: Vec<String>,
    /// Default command.
    pub command: Option<String>,
    /// Entrypoint.
    pub entrypoint: Option<String>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// Exposed ports, sorted.
    pub exposed_ports: Vec<String>,
    /// Number of filesystem layers.
    pub layers: usize,
}

/// The tail of a container's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSnapshot {
    /// Container as requested.
    pub container: String,
    /// Lines requested.
    pub tail: u32,
    /// Lines returned, oldest first.
    pub lines: Vec<String>,
}

/// Truncate an identifier for display, dropping any `sha256:` prefix.
#[must_use]
pub fn short_id(id: &str) -> String {
    id.strip_prefix("sha256:")
        .unwrap_or(id)
        .chars()
        .take(SHORT_ID_LEN)
        .collect()
}

/// Render a byte count with a base-1024 unit and at most two decimals.
///
/// `0` renders as `"0 B"`, `1536` as `"1.5 KB"`, `1073741824` as `"1 GB"`.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "byte counts are scaled for display only"
)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return String::from("0 B");
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < BYTE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    let label = BYTE_UNITS.get(unit).copied().unwrap_or("TB");
    format!("{} {label}", round2(value))
}

/// CPU usage as a percentage of the host's CPU time over the same window.
///
/// Returns `0.0` when the system delta is not positive.
#[expect(clippy::float_arithmetic, reason = "percentage of counter deltas")]
#[must_use]
pub const fn cpu_percent(cpu_delta: f64, system_delta: f64) -> f64 {
    if system_delta <= 0.0 {
        return 0.0;
    }
    100.0 * (cpu_delta / system_delta)
}

/// Memory usage as a percentage of the limit. A zero limit counts as one.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "percentage of byte counters"
)]
#[must_use]
pub const fn memory_percent(usage: u64, limit: u64) -> f64 {
    let guarded = if limit == 0 { 1 } else { limit };
    100.0 * usage as f64 / guarded as f64
}

#[expect(clippy::float_arithmetic, reason = "rounding for display")]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn unix_to_rfc3339(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|time| time.to_rfc3339())
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn strip_slash(name: &str) -> String {
    name.strip_prefix('/').unwrap_or(name).to_owned()
}

fn join_command(parts: &[String]) -> Option<String> {
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn format_port(port: &RawPort) -> String {
    match (port.ip.as_deref(), port.public_port) {
        (Some(ip), Some(public)) if !ip.is_empty() => {
            format!("{ip}:{public}->{}/{}", port.private_port, port.protocol)
        }
        (_, Some(public)) => format!("{public}->{}/{}", port.private_port, port.protocol),
        (_, None) => format!("{}/{}", port.private_port, port.protocol),
    }
}

fn sorted_keys<V>(map: &std::collections::HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

/// Reduce a container list entry.
#[must_use]
pub fn format_container(raw: &RawContainer) -> ContainerSummary {
    ContainerSummary {
        id: short_id(&raw.id),
        name: raw.names.first().map(|name| strip_slash(name)).unwrap_or_default(),
        image: raw.image.clone(),
        state: raw.state.clone(),
        status: raw.status.clone(),
        created: unix_to_rfc3339(raw.created),
        ports: raw.ports.iter().map(format_port).collect(),
    }
}

/// Reduce a container inspect record.
#[must_use]
pub fn format_container_detail(raw: &RawContainerDetail) -> ContainerDetail {
    let command = raw.path.as_deref().filter(|path| !path.is_empty()).map(|path| {
        std::iter::once(path)
            .chain(raw.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    });

    ContainerDetail {
        id: short_id(&raw.id),
        name: strip_slash(&raw.name),
        image: raw.config.image.clone().unwrap_or_default(),
        created: raw.created.clone(),
        status: raw.state.status.clone(),
        running: raw.state.running,
        exit_code: raw.state.exit_code,
        started_at: raw.state.started_at.clone(),
        finished_at: raw.state.finished_at.clone(),
        health: raw.state.health.as_ref().map(|health| health.status.clone()),
        restart_count: raw.restart_count,
        command,
        env: raw.config.env.clone(),
        labels: raw.config.labels.clone().into_iter().collect(),
        mounts: raw
            .mounts
            .iter()
            .map(|mount| MountSummary {
                kind: mount.kind.clone(),
                source: mount.source.clone(),
                destination: mount.destination.clone(),
                read_only: !mount.rw,
            })
            .collect(),
        networks: raw
            .network_settings
            .networks
            .iter()
            .map(|(name, endpoint)| (name.clone(), endpoint.ip_address.clone()))
            .collect(),
        exposed_ports: sorted_keys(&raw.config.exposed_ports),
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "counter deltas may be negative after an engine restart"
)]
const fn counter_delta(current: u64, previous: u64) -> f64 {
    current as f64 - previous as f64
}

fn cpu_window(current: &RawCpuStats, previous: &RawCpuStats) -> (f64, f64) {
    let cpu_delta = counter_delta(current.cpu_usage.total_usage, previous.cpu_usage.total_usage);
    let system_delta = counter_delta(
        current.system_cpu_usage.unwrap_or(0),
        previous.system_cpu_usage.unwrap_or(0),
    );
    (cpu_delta, system_delta)
}

fn block_bytes(raw: &RawStats, op: &str) -> u64 {
    raw.blkio_stats
        .io_service_bytes_recursive
        .iter()
        .flatten()
        .filter(|entry| entry.op.eq_ignore_ascii_case(op))
        .map(|entry| entry.value)
        .sum()
}

/// Reduce a resource-usage sample.
#[must_use]
pub fn format_stats(raw: &RawStats) -> ContainerStats {
    let (cpu_delta, system_delta) = cpu_window(&raw.cpu_stats, &raw.precpu_stats);
    let usage = raw.memory_stats.usage.unwrap_or(0);
    let limit = raw.memory_stats.limit.unwrap_or(0);
    let (rx, tx) = raw
        .networks
        .values()
        .fold((0_u64, 0_u64), |(rx, tx), interface| {
            (
                rx.saturating_add(interface.rx_bytes),
                tx.saturating_add(interface.tx_bytes),
            )
        });

    ContainerStats {
        cpu_percent: round2(cpu_percent(cpu_delta, system_delta)),
        memory_usage: format_bytes(usage),
        memory_limit: format_bytes(limit),
        memory_percent: round2(memory_percent(usage, limit)),
        network_rx: format_bytes(rx),
        network_tx: format_bytes(tx),
        block_read: format_bytes(block_bytes(raw, "read")),
        block_write: format_bytes(block_bytes(raw, "write")),
        pids: raw.pids_stats.current.unwrap_or(0),
    }
}

/// Reduce an image list entry.
#[must_use]
pub fn format_image(raw: &RawImage) -> ImageSummary {
    ImageSummary {
        id: short_id(&raw.id),
        tags: raw.repo_tags.clone(),
        created: unix_to_rfc3339(raw.created),
        size: format_bytes(non_negative(raw.size)),
        containers: (raw.containers >= 0).then_some(raw.containers),
    }
}

/// Reduce an image inspect record.
#[must_use]
pub fn format_image_detail(raw: &RawImageDetail) -> ImageDetail {
    ImageDetail {
        id: short_id(&raw.id),
        tags: raw.repo_tags.clone(),
        created: raw.created.clone(),
        architecture: raw.architecture.clone(),
        os: raw.os.clone(),
        size: format_bytes(non_negative(raw.size)),
        author: raw.author.clone().filter(|author| !author.is_empty()),
        env: raw.config.env.clone(),
        command: join_command(&raw.config.cmd),
        entrypoint: join_command(&raw.config.entrypoint),
        working_dir: raw.config.working_dir.clone().filter(|dir| !dir.is_empty()),
        exposed_ports: sorted_keys(&raw.config.exposed_ports),
        layers: raw.root_fs.layers.len(),
    }
}

/// Split combined log output into lines.
///
/// Blank lines the container wrote are kept; only the terminator after the
/// last line is dropped.
#[must_use]
pub fn format_logs(container: &str, tail: u32, text: &str) -> LogSnapshot {
    LogSnapshot {
        container: container.to_owned(),
        tail,
        lines: text.lines().map(str::to_owned).collect(),
    }
}
