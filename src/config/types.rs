//! Configuration data types for dockscope.

use clap::ValueEnum;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Default socket probed for the secondary local source.
#[cfg(unix)]
pub const DEFAULT_LOCAL_SOCKET: &str = "unix:///var/run/docker.sock";

/// Default named pipe probed for the secondary local source.
#[cfg(windows)]
pub const DEFAULT_LOCAL_SOCKET: &str = "npipe:////./pipe/docker_engine";

/// Default per-call deadline in milliseconds.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

/// How strictly the request guard in front of this engine should behave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Only allow-listed operations pass the guard.
    #[default]
    Strict,
    /// The guard reports but does not block.
    Permissive,
}

/// Verbosity of diagnostic logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational events.
    #[default]
    Info,
    /// Per-call diagnostics.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// The directive understood by `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Which backend sources are registered besides the default target.
#[derive(Debug, Clone, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Probe and register the local engine as a secondary source.
    pub allow_local: bool,

    /// Socket URI of the local engine. Never inferred from `DOCKER_HOST`.
    #[default(String::from(DEFAULT_LOCAL_SOCKET))]
    pub local_socket: String,
}

/// Session behaviour settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Request guard strictness.
    pub security_mode: SecurityMode,

    /// Emit audit events for every exposed operation.
    pub audit_enabled: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is not set.
    pub level: LogLevel,
}

/// Deadlines applied to outbound engine calls.
#[derive(Debug, Clone, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Per-call deadline in milliseconds.
    #[default(DEFAULT_CALL_TIMEOUT_MS)]
    pub call_ms: u64,
}

/// Root application configuration.
///
/// Loaded once at start-up with layered precedence (lowest to highest):
/// defaults, configuration file, environment variables, command-line
/// arguments. The result seeds the session configuration store and is what
/// a session reset returns to.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `DOCKSCOPE_CONFIG_PATH` environment variable
/// 2. `.dockscope.toml` in the current working directory
/// 3. `.dockscope.toml` in the home directory
/// 4. `~/.config/dockscope/config.toml` (XDG default)
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "DOCKSCOPE",
    post_merge_hook,
    discovery(
        app_name = "dockscope",
        env_var = "DOCKSCOPE_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".dockscope.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// Default target address (`scheme://host:port` or a socket URI).
    pub engine_host: Option<String>,

    /// Source registration settings.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub sources: SourcesConfig,

    /// Session behaviour settings.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub session: SessionSettings,

    /// Logging configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub logging: LoggingConfig,

    /// Call deadlines.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub timeouts: TimeoutsConfig,
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        // Blank hosts mean "unset"; address validation happens when the
        // session is seeded so the error can carry a suggestion.
        self.engine_host = self
            .engine_host
            .take()
            .map(|host| host.trim().to_owned())
            .filter(|host| !host.is_empty());
        Ok(())
    }
}
