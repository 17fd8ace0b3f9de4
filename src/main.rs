//! `dockscope` application entry point.
//!
//! Runs one read-only query and prints its JSON response on stdout.
//! Diagnostics go to stderr. It uses `eyre` for opaque error handling at the
//! application boundary, converting domain-specific errors into
//! human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/dockscope/config.toml` or path from `DOCKSCOPE_CONFIG_PATH`)
//! 3. Environment variables (`DOCKSCOPE_*`)
//! 4. Command-line arguments

use std::sync::Arc;

use clap::Parser;
use dockscope::api::Inspector;
use dockscope::config::{Cli, Commands, load_config};
use dockscope::engine::EngineConnector;
use dockscope::error::{DockscopeError, Result as DockscopeResult};
use dockscope::logging;
use dockscope::session::ProcessDefaults;
use eyre::{Report, Result as EyreResult};
use mockable::DefaultEnv;
use serde::Serialize;

/// Application entry point.
///
/// Loads configuration, installs the log subscriber and dispatches the
/// subcommand.
fn main() -> EyreResult<()> {
    let cli = Cli::parse();
    let env = DefaultEnv::new();

    let config = load_config(&cli, &env).map_err(Report::from)?;
    let defaults = ProcessDefaults::from_app_config(&config)
        .map_err(DockscopeError::from)
        .map_err(Report::from)?;
    logging::init(defaults.log_level, &env).map_err(Report::from)?;

    run(&cli, defaults).map_err(Report::from)
}

/// Execute the CLI command, returning domain-specific errors.
fn run(cli: &Cli, defaults: ProcessDefaults) -> DockscopeResult<()> {
    let runtime = tokio::runtime::Runtime::new().map_err(|error| {
        DockscopeError::RuntimeCreationFailed {
            message: error.to_string(),
        }
    })?;

    runtime.block_on(async {
        let inspector = Inspector::start(defaults, Arc::new(EngineConnector)).await;
        let host = cli.host.as_deref();

        match &cli.command {
            Commands::Ps(args) => print_json(&inspector.list_containers(args.all, host).await),
            Commands::Inspect(args) => {
                print_json(&inspector.inspect_container(&args.container, host).await)
            }
            Commands::Logs(args) => print_json(
                &inspector
                    .container_logs(&args.container, args.tail, host)
                    .await,
            ),
            Commands::Stats(args) => {
                print_json(&inspector.container_stats(&args.container, host).await)
            }
            Commands::Images => print_json(&inspector.list_images(host).await),
            Commands::Image(args) => print_json(&inspector.inspect_image(&args.image, host).await),
            Commands::Sources => print_json(&inspector.list_sources().await),
            Commands::Config => print_json(&inspector.session_config().await),
        }
    })
}

/// Print a response as pretty JSON on stdout.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_json<T: Serialize>(response: &T) -> DockscopeResult<()> {
    let rendered =
        serde_json::to_string_pretty(response).map_err(|error| DockscopeError::Output {
            message: error.to_string(),
        })?;
    println!("{rendered}");
    Ok(())
}
