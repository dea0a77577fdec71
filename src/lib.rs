//! # dbspin
//!
//! **Disposable, migration-verified database containers for local development**
//!
//! This crate provisions an ephemeral database inside a container, waits for
//! it to accept connections, applies (or generates) schema migrations
//! against it, and tears the container down afterward. It is the
//! coordinator that drives an existing container runtime and an existing
//! migration engine safely; it is not a container runtime, a migration DSL,
//! or a database engine.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            dbspin                                   │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────────┐    │
//! │  │                      Orchestrator                           │    │
//! │  │        start  │  stop  │  auto (guaranteed cleanup)         │    │
//! │  └──────┬─────────────────┬──────────────────────┬─────────────┘    │
//! │         │                 │                      │                  │
//! │  ┌──────▼───────┐  ┌──────▼────────┐  ┌──────────▼────────┐         │
//! │  │  Container   │  │  Readiness    │  │  MigrationGuard   │         │
//! │  │  Lifecycle   │  │  Waiter       │  │  (refuses double- │         │
//! │  │  Manager     │  │  (poll loop)  │  │   apply)          │         │
//! │  └──────┬───────┘  └──────┬────────┘  └──────────┬────────┘         │
//! │         │                 │                      │                  │
//! ├─────────┼─────────────────┼──────────────────────┼──────────────────┤
//! │  ┌──────▼───────┐  ┌──────▼────────┐  ┌──────────▼────────┐         │
//! │  │ Container    │  │ Connectivity  │  │ MigrationEngine   │         │
//! │  │ Runtime      │  │ Probe         │  │ (sqlx migrator)   │         │
//! │  │ (Docker API) │  │ (Postgres)    │  │                   │         │
//! │  └──────────────┘  └───────────────┘  └───────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Container State Machine
//!
//! The managed container lives under one reserved name
//! ([`constants::CONTAINER_NAME`]), enforcing a singleton instance:
//!
//! ```text
//!   ┌────────┐    run     ┌─────────┐
//!   │ Absent │ ─────────► │ Running │ ───┐ run (stop+remove+start,
//!   └────────┘            └─────────┘ ◄──┘  same name)
//!        ▲                     │
//!        └───────── stop ──────┘
//! ```
//!
//! `stop` on an absent container is a defined success, so cleanup paths call
//! it unconditionally.
//!
//! # Safety Rails
//!
//! - **Migration guard**: before applying, the migration engine's recorded
//!   history is queried; any prior history aborts with
//!   [`Error::AlreadyMigrated`] instead of double-initializing a database
//!   the user may have pointed at a live instance.
//! - **Bounded readiness**: the connection wait polls at a fixed interval
//!   under a total budget ([`constants::READY_TIMEOUT`]); non-transient
//!   probe failures abort immediately rather than being polled against.
//! - **Guaranteed teardown**: the `auto` flow stops the container on every
//!   exit path, and a cleanup failure never masks the original error.
//!
//! # Concurrency Model
//!
//! Strictly sequential; the only suspension point is the readiness poll
//! sleep. The reserved container name and the target database are shared
//! external resources — concurrent invocations from two processes are
//! unsupported and may race.
//!
//! # Example
//!
//! ```rust,ignore
//! use dbspin::{Config, DockerRuntime, Orchestrator, PgProbe, SqlxMigrationEngine};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> dbspin::Result<()> {
//!     let config = Config::load(Path::new("dbspin.toml"))?;
//!     let runtime = Arc::new(DockerRuntime::connect().await?);
//!     let engine = Arc::new(SqlxMigrationEngine::new(&config.migrations_dir));
//!
//!     let orchestrator = Orchestrator::new(config, runtime, Arc::new(PgProbe::new()), engine);
//!     orchestrator.start().await?;
//!     // ... use the database ...
//!     orchestrator.stop().await
//! }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod migrate;
pub mod orchestrator;
pub mod probe;
pub mod readiness;
pub mod runtime;

pub mod runtimes;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use guard::MigrationGuard;
pub use lifecycle::ContainerLifecycleManager;
pub use migrate::{MigrationEngine, MigrationState, SqlxMigrationEngine};
pub use orchestrator::Orchestrator;
pub use probe::{ConnectivityProbe, PgProbe, ProbeError, ProbeResult};
pub use readiness::ReadinessWaiter;
pub use runtime::{ContainerPhase, ContainerRuntime, RunSpec};
pub use runtimes::DockerRuntime;
