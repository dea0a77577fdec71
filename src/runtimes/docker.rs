//! Docker daemon runtime backend.
//!
//! Implements the [`ContainerRuntime`] boundary against a local Docker
//! daemon through its HTTP API. One client is constructed per process and
//! injected into the lifecycle manager; the daemon is pinged at construction
//! so a missing daemon fails fast instead of on the first flow step.
//!
//! [`ContainerRuntime`]: crate::runtime::ContainerRuntime

use crate::constants::STOP_GRACE_SECS;
use crate::error::{Error, Result};
use crate::runtime::{ContainerRuntime, RunSpec};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::{CreateImageOptions, ListImagesOptions};
use bollard::service::{HostConfig, PortBinding};
use bollard::Docker;
use futures_util::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info};

/// HTTP status the daemon returns for "container already stopped".
const STATUS_NOT_MODIFIED: u16 = 304;

/// HTTP status the daemon returns for "no such container".
const STATUS_NOT_FOUND: u16 = 404;

/// Container runtime backed by a local Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects to the local daemon and verifies it responds.
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        docker.ping().await?;
        debug!("connected to Docker daemon");
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_images(&self) -> Result<Vec<String>> {
        let options = ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        };
        let images = self.docker.list_images(Some(options)).await?;
        Ok(images
            .into_iter()
            .flat_map(|image| image.repo_tags)
            .collect())
    }

    async fn list_containers(&self) -> Result<Vec<String>> {
        // `all` includes stopped containers; a stopped leftover still
        // occupies the reserved name.
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers
            .into_iter()
            .flat_map(|c| c.names.unwrap_or_default())
            .map(|name| name.trim_start_matches('/').to_string())
            .collect())
    }

    async fn pull(&self, image: &str) -> Result<()> {
        info!(%image, "pulling image");

        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(result) = stream.next().await {
            match result {
                Ok(progress) => {
                    if let Some(status) = progress.status {
                        debug!(status = %status, "pull progress");
                    }
                }
                Err(e) => return Err(Error::image_pull(image, e.to_string())),
            }
        }

        info!(%image, "image pulled");
        Ok(())
    }

    async fn run(&self, spec: &RunSpec) -> Result<String> {
        let exposed_ports: HashMap<String, HashMap<(), ()>> = spec
            .ports
            .keys()
            .map(|port| (format!("{port}/tcp"), HashMap::new()))
            .collect();

        let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = spec
            .ports
            .iter()
            .map(|(container, host)| {
                let binding = PortBinding {
                    host_ip: None,
                    host_port: Some(host.to_string()),
                };
                (format!("{container}/tcp"), Some(vec![binding]))
            })
            .collect();

        let host_config = HostConfig {
            port_bindings: Some(port_bindings),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env_strings()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.as_str(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| Error::container_start(&spec.name, e.to_string()))?;

        self.docker
            .start_container(&response.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::container_start(&spec.name, e.to_string()))?;

        Ok(response.id)
    }

    async fn stop(&self, name: &str) -> Result<()> {
        let options = StopContainerOptions { t: STOP_GRACE_SECS };
        match self.docker.stop_container(name, Some(options)).await {
            Ok(()) => Ok(()),
            // Already stopped: the requested state holds.
            Err(DockerError::DockerResponseServerError {
                status_code: STATUS_NOT_MODIFIED,
                ..
            }) => Ok(()),
            Err(e) => Err(Error::container_stop(name, e.to_string())),
        }
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_container(name, Some(options)).await {
            Ok(()) => Ok(()),
            Err(DockerError::DockerResponseServerError {
                status_code: STATUS_NOT_FOUND,
                ..
            }) => Ok(()),
            Err(e) => Err(Error::container_stop(name, e.to_string())),
        }
    }
}
