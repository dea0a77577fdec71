//! # Runtime Constants
//!
//! Central definitions for the reserved container name, timing budgets, and
//! configuration defaults. These constants are the single source of truth
//! for the bounds the orchestration flows operate under.
//!
//! ## Cross-References
//!
//! - [`crate::lifecycle`]: Uses the reserved name and stop grace period
//! - [`crate::readiness`]: Uses the readiness timeout and poll interval
//! - [`crate::config`]: Uses the config-file defaults

use std::time::Duration;

// =============================================================================
// Container Identity
// =============================================================================

/// The reserved name for the managed container.
///
/// Every container this tool starts is created under this fixed name, which
/// enforces the singleton invariant: at most one managed database container
/// exists in the runtime at any time. [`crate::lifecycle`] stops and removes
/// any existing container under this name before starting a new one.
pub const CONTAINER_NAME: &str = "dbspin";

// =============================================================================
// Timing Budgets
// =============================================================================

/// Total wall-clock budget for the database to accept a connection (60 s).
///
/// Measured from the first probe attempt, not reset per attempt. Database
/// images that initialize data directories on first boot routinely need tens
/// of seconds before accepting connections.
pub const READY_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval between connectivity probe attempts (1 s).
pub const PROBE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Grace period given to the container process on stop, in seconds.
///
/// Passed to the runtime's stop operation; the process is killed after this
/// many seconds if it has not exited.
pub const STOP_GRACE_SECS: i64 = 10;

// =============================================================================
// Configuration Defaults
// =============================================================================

/// Default configuration file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "dbspin.toml";

/// The required table name inside the configuration file.
pub const CONFIG_SECTION: &str = "dbspin";

/// Default migrations directory consumed by the migration engine.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
