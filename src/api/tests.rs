//! Unit tests for the exposed operations.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rstest::{fixture, rstest};

use super::*;
use crate::config::{LogLevel, SecurityMode};
use crate::engine::mocks::{MockBackend, MockConnector};
use crate::error::SourceError;

const REMOTE: &str = "tcp://10.0.0.5:2375";
const OVERRIDE: &str = "tcp://10.0.0.9:2375";
const SOCKET: &str = "unix:///var/run/docker.sock";

fn descriptor(address: &str) -> EndpointDescriptor {
    EndpointDescriptor::parse(address).expect("test address should parse")
}

fn defaults(target: Option<&str>, allow_local: bool) -> ProcessDefaults {
    ProcessDefaults {
        default_target: target.map(descriptor),
        allow_secondary_source: allow_local,
        local_socket: descriptor(SOCKET),
        security_mode: SecurityMode::Strict,
        audit_enabled: true,
        log_level: LogLevel::Info,
        call_timeout: Duration::from_millis(200),
        captured_at: Utc::now(),
    }
}

/// Builds inspectors over mock engines. Remote descriptors other than
/// [`OVERRIDE`] get `remote`; the override gets `call_scoped`; the local
/// socket gets `local`, which always answers its ping.
struct Engines {
    remote: MockBackend,
    call_scoped: MockBackend,
    local: MockBackend,
}

impl Engines {
    fn new() -> Self {
        Self {
            remote: MockBackend::new(),
            call_scoped: MockBackend::new(),
            local: MockBackend::new(),
        }
    }

    fn inspector(mut self, target: Option<&str>, allow_local: bool) -> Inspector {
        self.local
            .expect_ping()
            .returning(|| Box::pin(async { Ok(()) }));
        let remote: Arc<dyn EngineBackend> = Arc::new(self.remote);
        let call_scoped: Arc<dyn EngineBackend> = Arc::new(self.call_scoped);
        let local: Arc<dyn EngineBackend> = Arc::new(self.local);

        let mut connector = MockConnector::new();
        connector.expect_connect_remote().returning(move |target| {
            if target.uri() == OVERRIDE {
                Ok(Arc::clone(&call_scoped))
            } else {
                Ok(Arc::clone(&remote))
            }
        });
        connector
            .expect_connect_local()
            .returning(move |_| Ok(Arc::clone(&local)));

        let store = Arc::new(SessionStore::new(defaults(target, allow_local)));
        let registry = Arc::new(SourceRegistry::new(
            Arc::clone(&store),
            Arc::new(connector),
            TimeoutInvoker::new(Duration::from_millis(200)),
        ));
        Inspector::new(store, registry)
    }
}

fn listing(backend: &mut MockBackend, result: Result<Vec<RawContainer>, SourceError>) {
    backend.expect_list_containers().returning(move |_| {
        let response = result.clone();
        Box::pin(async move { response })
    });
}

fn inspecting(backend: &mut MockBackend, result: Result<RawContainerDetail, SourceError>) {
    backend.expect_inspect_container().returning(move |_| {
        let response = result.clone();
        Box::pin(async move { response })
    });
}

fn container(id: &str) -> RawContainer {
    RawContainer {
        id: id.to_owned(),
        names: vec![format!("/{id}")],
        image: String::from("nginx:1.27"),
        state: String::from("running"),
        ..RawContainer::default()
    }
}

fn detail(id: &str) -> RawContainerDetail {
    RawContainerDetail {
        id: id.to_owned(),
        name: format!("/{id}"),
        ..RawContainerDetail::default()
    }
}

fn refused() -> SourceError {
    SourceError::ConnectionFailed {
        message: String::from("connection refused"),
    }
}

fn missing(id: &str) -> SourceError {
    SourceError::NotFound {
        resource: String::from("container"),
        id: id.to_owned(),
    }
}

fn tags<T>(items: &[Tagged<T>]) -> Vec<&str> {
    items.iter().map(|tagged| tagged.source.as_str()).collect()
}

#[fixture]
fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
}

// =============================================================================
// Aggregate queries
// =============================================================================

#[rstest]
fn list_containers_merges_every_source_with_tags(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    listing(&mut engines.remote, Ok(vec![container("api"), container("db")]));
    listing(&mut engines.local, Ok(vec![container("web")]));
    let inspector = engines.inspector(Some(REMOTE), true);

    let response = runtime_handle.block_on(inspector.list_containers(true, None));

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.message, None);
    let data = response.data.expect("combined containers");
    assert_eq!(tags(&data), vec!["remote", "remote", "local"]);
    let HostOrSources::Sources(reports) = response.host_or_sources else {
        panic!("expected per-source reports");
    };
    assert_eq!(reports.len(), 2);
    Ok(())
}

#[rstest]
fn unreachable_source_yields_partial_with_remaining_data(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    listing(&mut engines.remote, Err(refused()));
    listing(&mut engines.local, Ok(vec![container("web")]));
    let inspector = engines.inspector(Some(REMOTE), true);

    let response = runtime_handle.block_on(inspector.list_containers(false, None));

    assert_eq!(response.status, ResponseStatus::Partial);
    let message = response.message.clone().expect("partial message");
    assert!(message.contains("answered by local"), "{message}");
    assert!(message.contains("remote: failed to connect"), "{message}");
    let data = response.data.expect("local containers");
    assert_eq!(tags(&data), vec!["local"]);
    assert_eq!(response.setup_guide, None);
    Ok(())
}

#[rstest]
fn nothing_configured_yields_setup_guide(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let inspector = Engines::new().inspector(None, false);

    let response = runtime_handle.block_on(inspector.list_containers(false, None));

    assert_eq!(response.status, ResponseStatus::NoSource);
    let value = serde_json::to_value(&response).expect("response should serialise");
    assert_eq!(value["status"], "no_source");
    assert_eq!(value["hostOrSources"], serde_json::json!([]));
    assert!(value.get("data").is_none());
    let guide = value["setupGuide"].as_str().expect("setup guide text");
    assert!(guide.contains("configure_target"), "{guide}");
    assert!(guide.contains("DOCKSCOPE_ENGINE_HOST"), "{guide}");
    assert!(guide.contains("scheme://host:port"), "{guide}");
    Ok(())
}

#[rstest]
fn every_source_unreachable_yields_setup_guide(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    listing(&mut engines.remote, Err(refused()));
    let inspector = engines.inspector(Some(REMOTE), false);

    let response = runtime_handle.block_on(inspector.list_containers(false, None));

    assert_eq!(response.status, ResponseStatus::NoSource);
    let message = response.message.expect("no-source message");
    assert!(message.contains("could be reached"), "{message}");
    let guide = response.setup_guide.expect("setup guide");
    assert!(guide.contains(REMOTE), "{guide}");
    Ok(())
}

#[rstest]
fn missing_everywhere_is_not_a_connectivity_error(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    inspecting(&mut engines.remote, Err(missing("web")));
    inspecting(&mut engines.local, Err(missing("web")));
    let inspector = engines.inspector(Some(REMOTE), true);

    let response = runtime_handle.block_on(inspector.inspect_container("web", None));

    assert_eq!(response.status, ResponseStatus::Error);
    assert_eq!(
        response.message.as_deref(),
        Some("container 'web' was not found on any configured source")
    );
    assert_eq!(response.setup_guide, None);
    assert_eq!(response.data, None);
    Ok(())
}

#[rstest]
#[case::first_source_wins(Ok(detail("web")), ResponseStatus::Success, "remote")]
#[case::falls_through_to_next(Err(missing("web")), ResponseStatus::Partial, "local")]
fn inspect_takes_first_answer_in_registry_order(
    runtime: std::io::Result<tokio::runtime::Runtime>,
    #[case] remote_answer: Result<RawContainerDetail, SourceError>,
    #[case] expected_status: ResponseStatus,
    #[case] expected_source: &str,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    inspecting(&mut engines.remote, remote_answer);
    inspecting(&mut engines.local, Ok(detail("web")));
    let inspector = engines.inspector(Some(REMOTE), true);

    let response = runtime_handle.block_on(inspector.inspect_container("web", None));

    assert_eq!(response.status, expected_status);
    let found = response.data.expect("container detail");
    assert_eq!(found.source, expected_source);
    assert_eq!(found.item.name, "web");
    Ok(())
}

#[rstest]
fn container_logs_passes_tail_and_splits_lines(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    engines
        .remote
        .expect_container_logs()
        .withf(|id, tail| id == "web" && *tail == 5)
        .returning(|_, _| {
            Box::pin(async {
                Ok(String::from(
                    "2026-10-19T08:00:00Z starting\n2026-10-19T08:00:01Z ready\n",
                ))
            })
        });
    let inspector = engines.inspector(Some(REMOTE), false);

    let response = runtime_handle.block_on(inspector.container_logs("web", 5, None));

    assert_eq!(response.status, ResponseStatus::Success);
    let snapshot = response.data.expect("log snapshot").item;
    assert_eq!(snapshot.container, "web");
    assert_eq!(snapshot.tail, 5);
    assert_eq!(snapshot.lines.len(), 2);
    Ok(())
}

#[rstest]
fn container_stats_formats_the_sample(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    engines.remote.expect_container_stats().returning(|_| {
        let mut raw = RawStats::default();
        raw.memory_stats.usage = Some(1536);
        raw.memory_stats.limit = Some(3072);
        raw.pids_stats.current = Some(4);
        Box::pin(async move { Ok(raw) })
    });
    let inspector = engines.inspector(Some(REMOTE), false);

    let response = runtime_handle.block_on(inspector.container_stats("web", None));

    let stats = response.data.expect("stats sample").item;
    assert_eq!(stats.memory_usage, "1.5 KB");
    assert_eq!(stats.memory_percent, 50.0);
    assert_eq!(stats.cpu_percent, 0.0);
    assert_eq!(stats.pids, 4);
    Ok(())
}

#[rstest]
fn list_images_tags_each_image(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    engines.remote.expect_list_images().returning(|| {
        Box::pin(async {
            Ok(vec![RawImage {
                id: String::from("sha256:9a0b2e5c1d4f66ad9a0b2e5c"),
                repo_tags: vec![String::from("nginx:1.27")],
                size: 1_073_741_824,
                ..RawImage::default()
            }])
        })
    });
    let inspector = engines.inspector(Some(REMOTE), false);

    let response = runtime_handle.block_on(inspector.list_images(None));

    let images = response.data.expect("images");
    let image = images.first().expect("one image");
    assert_eq!(image.source, "remote");
    assert_eq!(image.item.id, "9a0b2e5c1d4f");
    assert_eq!(image.item.size, "1 GB");
    Ok(())
}

// =============================================================================
// Call-scoped targets
// =============================================================================

#[rstest]
fn call_scoped_host_bypasses_configured_sources(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    // The configured remote has no expectations; querying it fails the test.
    listing(&mut engines.call_scoped, Ok(vec![container("batch")]));
    let inspector = engines.inspector(Some(REMOTE), false);

    let response = runtime_handle.block_on(inspector.list_containers(false, Some(OVERRIDE)));

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(response.host_or_sources, HostOrSources::Host(OVERRIDE.to_owned()));
    let data = response.data.expect("override containers");
    assert_eq!(tags(&data), vec!["remote"]);
    assert!(inspector.registry().sources().is_empty());
    Ok(())
}

#[rstest]
fn malformed_call_scoped_host_is_an_error_with_suggestion(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let inspector = Engines::new().inspector(Some(REMOTE), false);

    let response = runtime_handle.block_on(inspector.inspect_container("web", Some("10.0.0.9:2375")));

    assert_eq!(response.status, ResponseStatus::Error);
    let message = response.message.expect("address error");
    assert!(message.contains("did you mean 'tcp://10.0.0.9:2375'"), "{message}");
    assert_eq!(response.setup_guide, None);
    Ok(())
}

#[rstest]
fn call_scoped_not_found_names_the_host(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    inspecting(&mut engines.call_scoped, Err(missing("web")));
    let inspector = engines.inspector(None, false);

    let response = runtime_handle.block_on(inspector.inspect_container("web", Some(OVERRIDE)));

    assert_eq!(response.status, ResponseStatus::Error);
    assert_eq!(
        response.message.as_deref(),
        Some("container 'web' not found on tcp://10.0.0.9:2375")
    );
    Ok(())
}

#[rstest]
fn unreachable_call_scoped_host_is_an_error_not_no_source(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let mut engines = Engines::new();
    listing(&mut engines.call_scoped, Err(refused()));
    let inspector = engines.inspector(None, false);

    let response = runtime_handle.block_on(inspector.list_containers(false, Some(OVERRIDE)));

    assert_eq!(response.status, ResponseStatus::Error);
    assert_eq!(response.setup_guide, None);
    let message = response.message.expect("connectivity message");
    assert!(message.starts_with("could not reach tcp://10.0.0.9:2375"), "{message}");
    Ok(())
}

// =============================================================================
// Session operations
// =============================================================================

#[rstest]
fn configure_target_registers_the_new_source(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let inspector = Engines::new().inspector(None, false);

    let response = runtime_handle.block_on(inspector.configure_target(Some(REMOTE)));

    assert_eq!(response.status, ResponseStatus::Success);
    let snapshot = response.data.expect("session snapshot");
    assert_eq!(snapshot.default_target, Some(descriptor(REMOTE)));
    let HostOrSources::Registered(registered) = response.host_or_sources else {
        panic!("expected registered sources");
    };
    let labels: Vec<&str> = registered.iter().map(|source| source.label.as_str()).collect();
    assert_eq!(labels, vec!["remote"]);
    Ok(())
}

#[rstest]
#[case("localhost")]
#[case("tcp://10.0.0.5")]
#[case("ftp://10.0.0.5:21")]
fn configure_target_rejects_malformed_address(
    runtime: std::io::Result<tokio::runtime::Runtime>,
    #[case] address: &str,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let inspector = Engines::new().inspector(Some(REMOTE), false);

    let response = runtime_handle.block_on(inspector.configure_target(Some(address)));

    assert_eq!(response.status, ResponseStatus::Error);
    assert_eq!(
        inspector.store().get().default_target,
        Some(descriptor(REMOTE)),
        "a rejected address leaves the session unchanged"
    );
    Ok(())
}

#[rstest]
fn blank_address_clears_the_target(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let inspector = Engines::new().inspector(Some(REMOTE), false);

    let response = runtime_handle.block_on(inspector.configure_target(Some("  ")));

    assert_eq!(response.status, ResponseStatus::Success);
    assert_eq!(inspector.store().get().default_target, None);
    Ok(())
}

#[rstest]
fn secondary_source_toggle_and_reset(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let inspector = Engines::new().inspector(Some(REMOTE), false);

    let enabled = runtime_handle.block_on(inspector.set_secondary_source(true));
    let sources = runtime_handle.block_on(inspector.list_sources());
    let reset = runtime_handle.block_on(inspector.reset_session());

    assert!(enabled.data.expect("snapshot").allow_secondary_source);
    let listed = sources.data.expect("source summaries");
    let labels: Vec<&str> = listed.iter().map(|source| source.label.as_str()).collect();
    assert_eq!(labels, vec!["remote", "local"]);
    let restored = reset.data.expect("snapshot");
    assert!(!restored.allow_secondary_source);
    assert_eq!(restored.set_by, crate::session::SetBy::ProcessEnv);
    assert_eq!(inspector.registry().sources().len(), 1);
    Ok(())
}

#[rstest]
fn list_sources_without_sources_is_no_source(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let inspector = Engines::new().inspector(None, false);

    let response = runtime_handle.block_on(inspector.list_sources());

    assert_eq!(response.status, ResponseStatus::NoSource);
    assert!(response.setup_guide.is_some());
    Ok(())
}

#[rstest]
fn session_config_serialises_in_camel_case(
    runtime: std::io::Result<tokio::runtime::Runtime>,
) -> std::io::Result<()> {
    let runtime_handle = runtime?;
    let inspector = Engines::new().inspector(None, true);

    let response = runtime_handle.block_on(inspector.session_config());

    let value = serde_json::to_value(&response).expect("response should serialise");
    assert_eq!(value["status"], "success");
    assert_eq!(value["data"]["allowSecondarySource"], true);
    assert_eq!(value["data"]["setBy"], "process-env");
    Ok(())
}
