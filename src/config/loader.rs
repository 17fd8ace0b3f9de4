//! Configuration loading with layered precedence.
//!
//! Precedence (lowest to highest): application defaults, configuration file,
//! environment variables, command-line arguments.
//!
//! Layers are composed by hand with `MergeComposer` rather than through the
//! derived `load()` so that:
//!
//! 1. the `Cli` struct keeps ownership of subcommand parsing;
//! 2. typed environment variables fail fast instead of being ignored;
//! 3. environment access goes through `mockable::Env` and can be faked.
//!
//! String fields (e.g., `DOCKSCOPE_ENGINE_HOST`) are always accepted. Typed
//! fields such as `DOCKSCOPE_SOURCES_ALLOW_LOCAL` must parse or loading fails.

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli};
use crate::error::{ConfigError, Result};

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Boolean value (`true`/`false`). Invalid values return an error.
    Bool,
    /// Unsigned 64-bit integer. Invalid values return an error.
    U64,
}

/// Specification for a single environment variable mapping.
struct EnvVarSpec {
    /// The environment variable name (e.g., `DOCKSCOPE_ENGINE_HOST`).
    env_var: &'static str,
    /// The JSON path segments (e.g., `["sources", "allow_local"]`).
    path: &'static [&'static str],
    /// The expected value type.
    var_type: EnvVarType,
}

/// Table of all environment variables and their JSON paths.
const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "DOCKSCOPE_ENGINE_HOST",
        path: &["engine_host"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "DOCKSCOPE_SOURCES_ALLOW_LOCAL",
        path: &["sources", "allow_local"],
        var_type: EnvVarType::Bool,
    },
    EnvVarSpec {
        env_var: "DOCKSCOPE_SOURCES_LOCAL_SOCKET",
        path: &["sources", "local_socket"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "DOCKSCOPE_SESSION_SECURITY_MODE",
        path: &["session", "security_mode"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "DOCKSCOPE_SESSION_AUDIT_ENABLED",
        path: &["session", "audit_enabled"],
        var_type: EnvVarType::Bool,
    },
    EnvVarSpec {
        env_var: "DOCKSCOPE_LOGGING_LEVEL",
        path: &["logging", "level"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "DOCKSCOPE_TIMEOUTS_CALL_MS",
        path: &["timeouts", "call_ms"],
        var_type: EnvVarType::U64,
    },
];

/// Returns the list of environment variable names recognised by the loader.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Load a configuration file and push it to the composer.
///
/// Opens the parent directory with `cap_std::fs_utf8` and reads the file
/// relative to it.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    let current_dir = Utf8PathBuf::from(".");
    let parent = path.parent().unwrap_or_else(|| current_dir.as_ref());
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Load configuration with full layer precedence.
///
/// # Errors
///
/// Returns `ConfigError` if configuration loading fails due to:
/// - A `--config` path that does not exist
/// - Malformed configuration files
/// - Invalid typed environment variable values (e.g., non-boolean for
///   `DOCKSCOPE_SOURCES_ALLOW_LOCAL`)
/// - Values the merged structure cannot hold (e.g., an unknown log level)
pub fn load_config<E: mockable::Env>(cli: &Cli, env: &E) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(missing) = cli.config.as_ref().filter(|p| !p.exists()) {
        return Err(ConfigError::FileNotFound {
            path: missing.clone().into_std_path_buf(),
        }
        .into());
    }

    let config_path: Option<Utf8PathBuf> = cli.config.clone().or_else(|| {
        let discovery = ConfigDiscovery::builder("dockscope")
            .env_var("DOCKSCOPE_CONFIG_PATH")
            .config_file_name("config.toml")
            .dotfile_name(".dockscope.toml")
            .build();
        discovery
            .candidates()
            .into_iter()
            .filter(|p| p.exists())
            .find_map(|p| Utf8PathBuf::try_from(p).ok())
    });

    if let Some(ref path) = config_path {
        load_config_file(path, &mut composer)?;
    }

    let env_values = collect_env_vars(env)?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;

    Ok(config)
}

/// Collect `DOCKSCOPE_*` environment variables into a JSON value.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if a typed variable (bool, u64) has an
/// unparseable value.
pub(crate) fn collect_env_vars<E: mockable::Env>(env: &E) -> Result<Value> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Some(raw_value) = env.string(spec.env_var) else {
            continue;
        };

        let json_value = match spec.var_type {
            EnvVarType::String => Value::String(raw_value),
            EnvVarType::Bool => match raw_value.parse::<bool>() {
                Ok(b) => Value::Bool(b),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected bool (true/false), got '{raw_value}'"),
                    }
                    .into());
                }
            },
            EnvVarType::U64 => match raw_value.parse::<u64>() {
                Ok(n) => Value::Number(n.into()),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected unsigned integer, got '{raw_value}'"),
                    }
                    .into());
                }
            },
        };

        insert_at_path(&mut root, spec.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Insert a value at a nested path in a JSON map, creating parents as needed.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(field.to_owned(), value);
}

/// Build a JSON value containing CLI overrides.
fn build_cli_overrides(cli: &Cli) -> serde_json::Value {
    let mut overrides = serde_json::Map::new();

    if let Some(ref host) = cli.engine_host {
        overrides.insert(
            "engine_host".to_owned(),
            serde_json::Value::String(host.clone()),
        );
    }

    if overrides.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::Value::Object(overrides)
    }
}
