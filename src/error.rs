//! Error types for the orchestration layer.

use std::time::Duration;

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while provisioning and migrating a database
/// container.
///
/// The first fatal error aborts the remaining steps of a flow; nothing is
/// retried at this level. The one deliberate non-error is stopping an absent
/// container, which [`crate::lifecycle::ContainerLifecycleManager::stop`]
/// reports as success.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Bad or missing configuration. Fatal, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    // =========================================================================
    // Container Runtime Errors
    // =========================================================================
    /// Image pull could not complete.
    #[error("failed to pull image '{image}': {reason}")]
    ImagePull { image: String, reason: String },

    /// The runtime rejected the container start (e.g. port conflict).
    #[error("failed to start container '{name}': {reason}")]
    ContainerStart { name: String, reason: String },

    /// The runtime failed to stop or remove an existing container.
    #[error("failed to stop container '{name}': {reason}")]
    ContainerStop { name: String, reason: String },

    /// Docker API transport failure outside the pull/start/stop paths.
    #[error("container runtime error: {0}")]
    Runtime(#[from] bollard::errors::Error),

    // =========================================================================
    // Readiness Errors
    // =========================================================================
    /// The readiness loop exhausted its full timeout budget.
    #[error("database at '{url}' not reachable after {timeout:?}")]
    ConnectivityTimeout { url: String, timeout: Duration },

    /// A probe failed in a way that is not a transient reachability problem
    /// (malformed URL, authentication failure). Surfaced immediately instead
    /// of being retried.
    #[error("connection probe against '{url}' failed: {reason}")]
    Probe { url: String, reason: String },

    // =========================================================================
    // Migration Errors
    // =========================================================================
    /// The target database already has migration history recorded.
    ///
    /// The guard refuses to apply migrations on top of an already-migrated
    /// database; this is a safety rail, not a recoverable condition.
    #[error("database at '{url}' already has migration history; refusing to apply")]
    AlreadyMigrated { url: String },

    /// The migration engine failed while applying pending migrations.
    #[error("failed to apply migrations: {0}")]
    MigrationApply(String),

    /// The migration engine failed while generating a new revision.
    #[error("failed to generate migration revision: {0}")]
    MigrationGenerate(String),

    // =========================================================================
    // Cleanup Errors
    // =========================================================================
    /// The `auto` flow failed and its unconditional cleanup failed too.
    ///
    /// The primary error is preserved as the cause of the aborted flow; the
    /// cleanup error is reported alongside it rather than masking it.
    #[error("{primary} (cleanup also failed: {cleanup})")]
    CleanupAfterFailure {
        primary: Box<Error>,
        cleanup: Box<Error>,
    },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an image pull error.
    pub fn image_pull(image: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImagePull {
            image: image.into(),
            reason: reason.into(),
        }
    }

    /// Creates a container start error.
    pub fn container_start(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContainerStart {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a container stop error.
    pub fn container_stop(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContainerStop {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Wraps a failed flow and its failed cleanup into one reportable error.
    pub fn cleanup_after_failure(primary: Error, cleanup: Error) -> Self {
        Self::CleanupAfterFailure {
            primary: Box::new(primary),
            cleanup: Box::new(cleanup),
        }
    }
}
