//! Container runtime implementations.
//!
//! This module contains the production implementations of the
//! [`ContainerRuntime`] boundary. Only the Docker daemon backend exists
//! today; the trait keeps the door open for others (Podman's Docker-compatible
//! API works through the same client).
//!
//! [`ContainerRuntime`]: crate::runtime::ContainerRuntime

pub mod docker;

pub use self::docker::DockerRuntime;
