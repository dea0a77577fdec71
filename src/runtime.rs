//! Container runtime boundary trait.
//!
//! This trait defines the container operations the orchestration flows need:
//! - `list_images`: Enumerate locally cached image tags
//! - `list_containers`: Enumerate container names (running and stopped)
//! - `pull`: Fetch an image from a registry
//! - `run`: Create and start a detached container
//! - `stop` / `remove`: Tear a container down
//!
//! # One Boundary, Many Transports
//!
//! Implementations are agnostic to transport as long as these operations are
//! available awaitably. The production implementation talks to a local
//! Docker daemon ([`crate::runtimes::DockerRuntime`]); tests substitute
//! recording mocks.
//!
//! # No Retry Semantics
//!
//! This trait performs single operations. Idempotency rules (replace an
//! existing container before starting, tolerate stopping an absent one) live
//! in [`crate::lifecycle`], not here — with two exceptions at the transport
//! level: `stop` on an already-stopped container and `remove` of a missing
//! container are reported as success, since both leave the runtime in the
//! requested state.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Container Phase
// =============================================================================

/// Lifecycle phase of the managed container, as the lifecycle manager sees
/// it.
///
/// ```text
///   Absent --run--> Running --stop--> Absent
///                   Running --run--> Running   (replace under same name)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerPhase {
    /// No container with the reserved name exists in the runtime.
    Absent,
    /// A container with the reserved name exists.
    Running,
}

impl std::fmt::Display for ContainerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Running => write!(f, "running"),
        }
    }
}

// =============================================================================
// Run Spec
// =============================================================================

/// Everything the runtime needs to create and start one detached container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSpec {
    /// Image reference (e.g. `postgres:16`).
    pub image: String,
    /// Container name. The lifecycle manager always passes the reserved name.
    pub name: String,
    /// Environment variables injected into the container.
    pub env: BTreeMap<String, String>,
    /// Port mappings, container port → host port.
    pub ports: BTreeMap<u16, u16>,
}

impl RunSpec {
    /// Builds a run spec for the given image and name.
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            env: BTreeMap::new(),
            ports: BTreeMap::new(),
        }
    }

    /// Renders the environment as `KEY=VALUE` strings, sorted by key.
    pub fn env_strings(&self) -> Vec<String> {
        self.env.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

// =============================================================================
// Container Runtime Trait
// =============================================================================

/// Container runtime boundary.
///
/// # Lifecycle
///
/// ```text
/// list_images → [pull] → run(spec) → ... → stop(name) → remove(name)
/// ```
///
/// # Implementations
///
/// - [`DockerRuntime`]: local Docker daemon via its HTTP API
///
/// [`DockerRuntime`]: crate::runtimes::DockerRuntime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Lists locally cached image tags (e.g. `postgres:16`).
    async fn list_images(&self) -> Result<Vec<String>>;

    /// Lists container names known to the runtime, running **and** stopped.
    ///
    /// Stopped containers must be included: a leftover stopped container
    /// under the reserved name still occupies it and must be replaced before
    /// a new one can start.
    async fn list_containers(&self) -> Result<Vec<String>>;

    /// Pulls an image from its registry.
    ///
    /// # Errors
    ///
    /// [`Error::ImagePull`] if the pull cannot complete.
    ///
    /// [`Error::ImagePull`]: crate::error::Error::ImagePull
    async fn pull(&self, image: &str) -> Result<()>;

    /// Creates and starts a detached container.
    ///
    /// The caller guarantees no container with `spec.name` exists; the
    /// runtime does not replace one.
    ///
    /// # Returns
    ///
    /// The runtime-assigned container id.
    ///
    /// # Errors
    ///
    /// [`Error::ContainerStart`] on runtime rejection (e.g. port conflict).
    ///
    /// [`Error::ContainerStart`]: crate::error::Error::ContainerStart
    async fn run(&self, spec: &RunSpec) -> Result<String>;

    /// Stops a container by name.
    ///
    /// Stopping a container that is already stopped is success. Stopping a
    /// container that does not exist is an error — existence filtering is
    /// the lifecycle manager's job.
    async fn stop(&self, name: &str) -> Result<()>;

    /// Removes a stopped container by name. Removing a container that does
    /// not exist is success.
    async fn remove(&self, name: &str) -> Result<()>;
}
