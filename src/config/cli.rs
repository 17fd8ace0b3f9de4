//! Command-line argument definitions for dockscope.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line interface for dockscope.
#[derive(Debug, Parser)]
#[command(name = "dockscope")]
#[command(
    author,
    version,
    about = "Read-only introspection across one or more container engines"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Default target for this process (`scheme://host:port` or socket URI).
    #[arg(long, global = true)]
    pub engine_host: Option<String>,

    /// Query only this target, bypassing configured sources.
    #[arg(long, global = true)]
    pub host: Option<String>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List containers across all configured sources.
    Ps(PsArgs),

    /// Show the details of one container.
    Inspect(ContainerArgs),

    /// Show the most recent log lines of a container.
    Logs(LogsArgs),

    /// Show a single resource-usage sample for a container.
    Stats(ContainerArgs),

    /// List images across all configured sources.
    Images,

    /// Show the details of one image.
    Image(ImageArgs),

    /// List the registered sources and their last known status.
    Sources,

    /// Show the effective session configuration.
    Config,
}

/// Arguments for the `ps` subcommand.
#[derive(Debug, Parser)]
pub struct PsArgs {
    /// Include stopped containers.
    #[arg(long, short)]
    pub all: bool,
}

/// Arguments naming a single container.
#[derive(Debug, Parser)]
pub struct ContainerArgs {
    /// Container ID or name.
    #[arg(required = true)]
    pub container: String,
}

/// Arguments for the `logs` subcommand.
#[derive(Debug, Parser)]
pub struct LogsArgs {
    /// Container ID or name.
    #[arg(required = true)]
    pub container: String,

    /// Number of lines to return from the end of the log.
    #[arg(long, default_value_t = crate::api::DEFAULT_LOG_TAIL)]
    pub tail: u32,
}

/// Arguments for the `image` subcommand.
#[derive(Debug, Parser)]
pub struct ImageArgs {
    /// Image ID or reference.
    #[arg(required = true)]
    pub image: String,
}
