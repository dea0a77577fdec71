//! End-to-end flow tests against recording boundary doubles.
//!
//! These exercise the `start` / `stop` / `auto` sequencing, the
//! abort-on-first-error rule, and `auto`'s guaranteed teardown.

use async_trait::async_trait;
use dbspin::{
    Config, ConnectivityProbe, ContainerRuntime, Error, MigrationEngine, MigrationState,
    Orchestrator, ProbeError, ProbeResult, Result, RunSpec,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const URL: &str = "postgres://postgres:x@localhost:5432/app";

fn test_config() -> Config {
    Config {
        image: "db:latest".to_string(),
        env: BTreeMap::from([("PASS".to_string(), "x".to_string())]),
        ports: BTreeMap::from([(5432, 5432)]),
        database_url: URL.to_string(),
        migrations_dir: PathBuf::from("migrations"),
    }
}

// =============================================================================
// Boundary Doubles
// =============================================================================

#[derive(Default)]
struct FakeRuntime {
    images: Mutex<Vec<String>>,
    containers: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
    last_spec: Mutex<Option<RunSpec>>,
    fail_stop: bool,
}

impl FakeRuntime {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn has_container(&self, name: &str) -> bool {
        self.containers.lock().unwrap().iter().any(|n| n == name)
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_images(&self) -> Result<Vec<String>> {
        Ok(self.images.lock().unwrap().clone())
    }

    async fn list_containers(&self) -> Result<Vec<String>> {
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn pull(&self, image: &str) -> Result<()> {
        self.calls.lock().unwrap().push("pull".to_string());
        self.images.lock().unwrap().push(image.to_string());
        Ok(())
    }

    async fn run(&self, spec: &RunSpec) -> Result<String> {
        self.calls.lock().unwrap().push("run".to_string());
        self.containers.lock().unwrap().push(spec.name.clone());
        *self.last_spec.lock().unwrap() = Some(spec.clone());
        Ok("0123456789abcdef".to_string())
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push("stop".to_string());
        if self.fail_stop {
            return Err(Error::container_stop(name, "daemon went away"));
        }
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push("remove".to_string());
        self.containers.lock().unwrap().retain(|n| n != name);
        Ok(())
    }
}

/// Probe that reports unreachable until the configured attempt (0 = never
/// reachable).
#[derive(Default)]
struct FlakyProbe {
    attempts: AtomicU32,
    succeed_on: u32,
}

impl FlakyProbe {
    fn reachable_on(attempt: u32) -> Self {
        Self {
            succeed_on: attempt,
            ..Default::default()
        }
    }

    fn never_reachable() -> Self {
        Self::default()
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectivityProbe for FlakyProbe {
    async fn probe(&self, _url: &str) -> ProbeResult {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.succeed_on != 0 && attempt >= self.succeed_on {
            Ok(())
        } else {
            Err(ProbeError::Unreachable("connection refused".into()))
        }
    }
}

struct FakeEngine {
    state: MigrationState,
    calls: Mutex<Vec<String>>,
}

impl FakeEngine {
    fn with_state(state: MigrationState) -> Self {
        Self {
            state,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MigrationEngine for FakeEngine {
    async fn current_state(&self, _url: &str) -> Result<MigrationState> {
        self.calls.lock().unwrap().push("current_state".to_string());
        Ok(self.state.clone())
    }

    async fn upgrade(&self, _url: &str) -> Result<()> {
        self.calls.lock().unwrap().push("upgrade".to_string());
        Ok(())
    }

    async fn autogenerate_revision(&self, _url: &str, message: &str) -> Result<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("autogenerate:{message}"));
        Ok(PathBuf::from("migrations/20260806120000_revision.sql"))
    }
}

struct Harness {
    runtime: Arc<FakeRuntime>,
    probe: Arc<FlakyProbe>,
    engine: Arc<FakeEngine>,
    orchestrator: Orchestrator,
}

fn harness(runtime: FakeRuntime, probe: FlakyProbe, engine: FakeEngine) -> Harness {
    let runtime = Arc::new(runtime);
    let probe = Arc::new(probe);
    let engine = Arc::new(engine);
    let orchestrator = Orchestrator::new(
        test_config(),
        runtime.clone(),
        probe.clone(),
        engine.clone(),
    )
    .with_ready_timeout(Duration::from_secs(5));
    Harness {
        runtime,
        probe,
        engine,
        orchestrator,
    }
}

// =============================================================================
// start
// =============================================================================

#[tokio::test(start_paused = true)]
async fn start_provisions_waits_and_migrates() {
    let h = harness(
        FakeRuntime::default(),
        FlakyProbe::reachable_on(3),
        FakeEngine::with_state(MigrationState::empty()),
    );

    h.orchestrator.start().await.unwrap();

    // Image was absent: pulled exactly once, container started once.
    assert_eq!(h.runtime.count("pull"), 1);
    assert_eq!(h.runtime.count("run"), 1);

    // The container got the configured env and ports.
    let spec = h.runtime.last_spec.lock().unwrap().clone().unwrap();
    assert_eq!(spec.image, "db:latest");
    assert_eq!(spec.env["PASS"], "x");
    assert_eq!(spec.ports[&5432], 5432);

    // Two unreachable probes, then success.
    assert_eq!(h.probe.attempts(), 3);

    // Empty history: migrations applied exactly once.
    assert_eq!(h.engine.calls(), vec!["current_state", "upgrade"]);

    // start never tears down.
    assert_eq!(h.runtime.count("stop"), 0);
    assert!(h.runtime.has_container("dbspin"));
}

#[tokio::test(start_paused = true)]
async fn start_skips_pull_when_image_cached() {
    let runtime = FakeRuntime {
        images: Mutex::new(vec!["db:latest".to_string()]),
        ..Default::default()
    };
    let h = harness(
        runtime,
        FlakyProbe::reachable_on(1),
        FakeEngine::with_state(MigrationState::empty()),
    );

    h.orchestrator.start().await.unwrap();

    assert_eq!(h.runtime.count("pull"), 0);
    assert_eq!(h.runtime.count("run"), 1);
}

#[tokio::test(start_paused = true)]
async fn start_aborts_on_existing_history_and_leaves_container_running() {
    let h = harness(
        FakeRuntime::default(),
        FlakyProbe::reachable_on(1),
        FakeEngine::with_state(MigrationState::with_versions(vec![20240101000000])),
    );

    let err = h.orchestrator.start().await.unwrap_err();

    assert!(matches!(err, Error::AlreadyMigrated { .. }));
    // The guard refused before any upgrade.
    assert_eq!(h.engine.calls(), vec!["current_state"]);
    // No implicit teardown: the container stays up for inspection.
    assert_eq!(h.runtime.count("stop"), 0);
    assert!(h.runtime.has_container("dbspin"));
}

#[tokio::test(start_paused = true)]
async fn start_aborts_on_readiness_timeout_before_touching_migrations() {
    let h = harness(
        FakeRuntime::default(),
        FlakyProbe::never_reachable(),
        FakeEngine::with_state(MigrationState::empty()),
    );

    let err = h.orchestrator.start().await.unwrap_err();

    assert!(matches!(err, Error::ConnectivityTimeout { .. }));
    assert!(h.engine.calls().is_empty());
}

// =============================================================================
// stop
// =============================================================================

#[tokio::test]
async fn stop_without_container_succeeds() {
    let h = harness(
        FakeRuntime::default(),
        FlakyProbe::never_reachable(),
        FakeEngine::with_state(MigrationState::empty()),
    );

    h.orchestrator.stop().await.unwrap();
    assert_eq!(h.runtime.count("stop"), 0);
}

// =============================================================================
// auto
// =============================================================================

#[tokio::test(start_paused = true)]
async fn auto_generates_revision_and_tears_down() {
    let h = harness(
        FakeRuntime::default(),
        FlakyProbe::reachable_on(1),
        FakeEngine::with_state(MigrationState::empty()),
    );

    let path = h.orchestrator.auto("add users table").await.unwrap();

    assert!(path.to_string_lossy().ends_with(".sql"));
    assert_eq!(
        h.engine.calls(),
        vec!["current_state", "upgrade", "autogenerate:add users table"]
    );
    // Torn down on the success path too.
    assert!(!h.runtime.has_container("dbspin"));
}

#[tokio::test(start_paused = true)]
async fn auto_cleans_up_after_readiness_timeout_and_surfaces_it() {
    let h = harness(
        FakeRuntime::default(),
        FlakyProbe::never_reachable(),
        FakeEngine::with_state(MigrationState::empty()),
    );

    let err = h.orchestrator.auto("add users table").await.unwrap_err();

    // The surfaced error is the timeout, not anything from cleanup.
    assert!(matches!(err, Error::ConnectivityTimeout { .. }));
    // The revision step never ran.
    assert!(h.engine.calls().is_empty());
    // Cleanup still executed.
    assert_eq!(h.runtime.count("stop"), 1);
    assert!(!h.runtime.has_container("dbspin"));
}

#[tokio::test(start_paused = true)]
async fn auto_reports_both_errors_when_cleanup_also_fails() {
    let runtime = FakeRuntime {
        fail_stop: true,
        ..Default::default()
    };
    let h = harness(
        runtime,
        FlakyProbe::never_reachable(),
        FakeEngine::with_state(MigrationState::empty()),
    );

    let err = h.orchestrator.auto("add users table").await.unwrap_err();

    match err {
        Error::CleanupAfterFailure { primary, cleanup } => {
            assert!(matches!(*primary, Error::ConnectivityTimeout { .. }));
            assert!(matches!(*cleanup, Error::ContainerStop { .. }));
        }
        other => panic!("expected CleanupAfterFailure, got: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn auto_surfaces_cleanup_failure_after_successful_flow() {
    let runtime = FakeRuntime {
        fail_stop: true,
        ..Default::default()
    };
    let h = harness(
        runtime,
        FlakyProbe::reachable_on(1),
        FakeEngine::with_state(MigrationState::empty()),
    );

    let err = h.orchestrator.auto("add users table").await.unwrap_err();

    // The main flow completed; losing the teardown is the flow's error.
    assert!(matches!(err, Error::ContainerStop { .. }));
    assert_eq!(
        h.engine.calls(),
        vec!["current_state", "upgrade", "autogenerate:add users table"]
    );
}
