//! Configuration system for dockscope.
//!
//! Process configuration is loaded once at start-up with the `ortho_config`
//! crate. Precedence: CLI flags override environment variables, which
//! override configuration files, which override defaults. The loaded
//! configuration becomes the process defaults of the session store.
//!
//! The configuration file is expected at `~/.config/dockscope/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! engine_host = "tcp://10.0.0.5:2375"
//!
//! [sources]
//! allow_local = true
//! local_socket = "unix:///var/run/docker.sock"
//!
//! [session]
//! security_mode = "strict"
//! audit_enabled = false
//!
//! [logging]
//! level = "info"
//!
//! [timeouts]
//! call_ms = 10000
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{Cli, Commands, ContainerArgs, ImageArgs, LogsArgs, PsArgs};
pub use loader::{env_var_names, load_config};
pub use types::{
    AppConfig, DEFAULT_CALL_TIMEOUT_MS, DEFAULT_LOCAL_SOCKET, LogLevel, LoggingConfig,
    SecurityMode, SessionSettings, SourcesConfig, TimeoutsConfig,
};
