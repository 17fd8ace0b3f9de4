//! Shared fixtures and helper functions for config tests.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::MockEnv;
use ortho_config::MergeComposer;
use rstest::fixture;

use crate::config::{AppConfig, DEFAULT_CALL_TIMEOUT_MS, DEFAULT_LOCAL_SOCKET, LogLevel, SecurityMode};

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        engine_host = "tcp://10.0.0.5:2375"

        [sources]
        allow_local = true
        local_socket = "unix:///run/podman/podman.sock"

        [session]
        security_mode = "permissive"
        audit_enabled = true

        [logging]
        level = "debug"

        [timeouts]
        call_ms = 2500
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let toml = r#"
        engine_host = "tcp://docker-host:2376"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Build a `MockEnv` that answers from the given variables only.
pub fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
    let owned: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (String::from(*k), String::from(*v)))
        .collect();
    let mut env = MockEnv::new();
    env.expect_string().returning(move |key| owned.get(key).cloned());
    env
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(config.engine_host.is_none(), "engine_host should be None");
    assert!(!config.sources.allow_local, "sources.allow_local should be false");
    assert_eq!(
        config.sources.local_socket, DEFAULT_LOCAL_SOCKET,
        "sources.local_socket should be the platform default"
    );
    assert_eq!(config.session.security_mode, SecurityMode::Strict);
    assert!(!config.session.audit_enabled, "session.audit_enabled should be false");
    assert_eq!(config.logging.level, LogLevel::Info);
    assert_eq!(config.timeouts.call_ms, DEFAULT_CALL_TIMEOUT_MS);
}

/// Helper: Creates a `MergeComposer` with defaults, file, and env layers.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    use ortho_config::serde_json::json;

    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "engine_host": "tcp://file-host:2375",
            "sources": { "allow_local": true }
        }),
        None,
    );

    composer.push_environment(json!({
        "engine_host": "tcp://env-host:2375"
    }));

    Ok(composer)
}
