//! Container lifecycle management.
//!
//! The lifecycle manager owns the reserved-name container state machine:
//!
//! ```text
//!   Absent --run--> Running --stop--> Absent
//!                   Running --run--> Running   (stop + remove + start)
//! ```
//!
//! It holds one injected [`ContainerRuntime`] client for its whole lifetime
//! rather than re-acquiring a runtime handle per operation. There is no
//! terminal state; the manager is re-entrant across repeated start/stop
//! cycles within one process lifetime.

use crate::constants::CONTAINER_NAME;
use crate::error::Result;
use crate::runtime::{ContainerPhase, ContainerRuntime, RunSpec};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Manages the single reserved-name container.
pub struct ContainerLifecycleManager {
    runtime: Arc<dyn ContainerRuntime>,
    name: &'static str,
}

impl ContainerLifecycleManager {
    /// Creates a manager over the given runtime client.
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            name: CONTAINER_NAME,
        }
    }

    /// The reserved container name this manager enforces.
    pub fn container_name(&self) -> &str {
        self.name
    }

    /// Reports whether the reserved-name container currently exists.
    pub async fn phase(&self) -> Result<ContainerPhase> {
        let containers = self.runtime.list_containers().await?;
        if containers.iter().any(|n| n == self.name) {
            Ok(ContainerPhase::Running)
        } else {
            Ok(ContainerPhase::Absent)
        }
    }

    /// Ensures `image` is present locally, pulling it if absent.
    ///
    /// # Errors
    ///
    /// [`Error::ImagePull`] if the pull cannot complete.
    ///
    /// [`Error::ImagePull`]: crate::error::Error::ImagePull
    pub async fn ensure_image(&self, image: &str) -> Result<()> {
        let cached = self.runtime.list_images().await?;
        if cached.iter().any(|tag| tag == image) {
            debug!(%image, "image already cached");
            return Ok(());
        }

        info!(%image, "pulling image");
        self.runtime.pull(image).await
    }

    /// Starts a detached container under the reserved name.
    ///
    /// If a container with the reserved name already exists — running or
    /// stopped — it is stopped and removed first. Starting never fails
    /// merely because a previous container existed, and never leaves two
    /// containers under the name.
    ///
    /// # Errors
    ///
    /// [`Error::ContainerStart`] on runtime rejection,
    /// [`Error::ContainerStop`] if an existing container cannot be replaced.
    ///
    /// [`Error::ContainerStart`]: crate::error::Error::ContainerStart
    /// [`Error::ContainerStop`]: crate::error::Error::ContainerStop
    pub async fn run(
        &self,
        image: &str,
        env: &BTreeMap<String, String>,
        ports: &BTreeMap<u16, u16>,
    ) -> Result<String> {
        if self.phase().await? == ContainerPhase::Running {
            info!(name = %self.name, "replacing existing container");
            self.stop().await?;
        }

        info!(%image, name = %self.name, "starting container");
        let spec = RunSpec {
            image: image.to_string(),
            name: self.name.to_string(),
            env: env.clone(),
            ports: ports.clone(),
        };
        let id = self.runtime.run(&spec).await?;
        info!(name = %self.name, id = %short_id(&id), "container started");
        Ok(id)
    }

    /// Stops and removes the reserved-name container.
    ///
    /// A missing container is a no-op success, so cleanup paths can call
    /// this unconditionally.
    ///
    /// # Errors
    ///
    /// [`Error::ContainerStop`] only when an existing container cannot be
    /// stopped or removed.
    ///
    /// [`Error::ContainerStop`]: crate::error::Error::ContainerStop
    pub async fn stop(&self) -> Result<()> {
        if self.phase().await? == ContainerPhase::Absent {
            info!(name = %self.name, "no container to stop");
            return Ok(());
        }

        info!(name = %self.name, "stopping container");
        self.runtime.stop(self.name).await?;
        self.runtime.remove(self.name).await?;
        info!(name = %self.name, "container removed");
        Ok(())
    }
}

/// First 12 characters of a runtime container id, for log output.
fn short_id(id: &str) -> &str {
    if id.len() > 12 {
        &id[..12]
    } else {
        id
    }
}
