//! The three user-facing flows.
//!
//! ```text
//! start: ensure_image → run → wait(60 s) → check_and_apply
//! stop:  lifecycle.stop()
//! auto:  start → create_revision → stop   (stop runs on every exit path)
//! ```
//!
//! The first failure inside a flow aborts the remaining steps and
//! propagates. `start` performs no cleanup of its own — after a migration
//! failure the container is left running so the operator can inspect it.
//! `auto` tears the container down unconditionally; a cleanup failure never
//! masks the error that aborted the main flow.

use crate::config::Config;
use crate::constants::READY_TIMEOUT;
use crate::error::{Error, Result};
use crate::guard::MigrationGuard;
use crate::lifecycle::ContainerLifecycleManager;
use crate::migrate::MigrationEngine;
use crate::probe::ConnectivityProbe;
use crate::readiness::ReadinessWaiter;
use crate::runtime::ContainerRuntime;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Composes the lifecycle manager, readiness waiter, and migration guard
/// into the `start` / `stop` / `auto` flows.
pub struct Orchestrator {
    config: Config,
    lifecycle: ContainerLifecycleManager,
    waiter: ReadinessWaiter,
    guard: MigrationGuard,
    ready_timeout: Duration,
}

impl Orchestrator {
    /// Builds an orchestrator from its injected boundary implementations.
    pub fn new(
        config: Config,
        runtime: Arc<dyn ContainerRuntime>,
        probe: Arc<dyn ConnectivityProbe>,
        engine: Arc<dyn MigrationEngine>,
    ) -> Self {
        Self {
            config,
            lifecycle: ContainerLifecycleManager::new(runtime),
            waiter: ReadinessWaiter::new(probe),
            guard: MigrationGuard::new(engine),
            ready_timeout: READY_TIMEOUT,
        }
    }

    /// Overrides the readiness timeout. Intended for tests and unusual
    /// images; flows default to [`READY_TIMEOUT`].
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// The configuration this orchestrator runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Provisions the container, waits for readiness, and applies
    /// migrations.
    ///
    /// On failure the container is intentionally left running for
    /// inspection; no partial-state cleanup happens here.
    pub async fn start(&self) -> Result<()> {
        self.lifecycle.ensure_image(&self.config.image).await?;
        self.lifecycle
            .run(&self.config.image, &self.config.env, &self.config.ports)
            .await?;
        self.waiter
            .wait(&self.config.database_url, self.ready_timeout)
            .await?;
        self.guard.check_and_apply(&self.config.database_url).await
    }

    /// Stops and removes the managed container. Success when none exists.
    pub async fn stop(&self) -> Result<()> {
        self.lifecycle.stop().await
    }

    /// Runs `start`, generates a new revision, and tears the container down
    /// on every exit path.
    ///
    /// # Errors
    ///
    /// The error that aborted the main flow, surfaced after cleanup has run.
    /// If cleanup fails too, both are reported via
    /// [`Error::CleanupAfterFailure`]. If only cleanup fails, its error is
    /// returned.
    pub async fn auto(&self, message: &str) -> Result<PathBuf> {
        let main = self.start_and_revise(message).await;
        let cleanup = self.lifecycle.stop().await;

        match (main, cleanup) {
            (Ok(path), Ok(())) => {
                info!(revision = %path.display(), "revision generated");
                Ok(path)
            }
            (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
            (Err(primary), Ok(())) => Err(primary),
            (Err(primary), Err(cleanup_err)) => {
                warn!(error = %cleanup_err, "cleanup failed after flow error");
                Err(Error::cleanup_after_failure(primary, cleanup_err))
            }
        }
    }

    /// The `auto` main flow, separated so cleanup wraps it uniformly.
    async fn start_and_revise(&self, message: &str) -> Result<PathBuf> {
        self.start().await?;
        self.guard
            .create_revision(&self.config.database_url, message)
            .await
    }
}
