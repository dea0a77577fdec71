//! Migration engine boundary.
//!
//! This module defines the operations the orchestration flows need from a
//! migration engine:
//! - `current_state`: Which revisions are recorded against a database
//! - `upgrade`: Apply all pending migrations up to the latest revision
//! - `autogenerate_revision`: Start a new revision file for authoring
//!
//! The history check is a structured query against the engine's recorded
//! migrations, never an inspection of command output. The engine's internal
//! diff/apply mechanics are not modeled here.
//!
//! The production implementation, [`SqlxMigrationEngine`], drives sqlx's
//! migrator over a filesystem migrations directory.

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::{Migrate, MigrateError, Migrator};
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Postgres SQLSTATE for "relation does not exist".
///
/// Raised by the history query when the migrations bookkeeping table was
/// never created, which is exactly the no-history case.
const SQLSTATE_UNDEFINED_TABLE: &str = "42P01";

// =============================================================================
// Migration State
// =============================================================================

/// The migration history recorded against one database.
///
/// Produced by [`MigrationEngine::current_state`], consumed by
/// [`crate::guard::MigrationGuard`]. Not persisted by this system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationState {
    versions: Vec<i64>,
}

impl MigrationState {
    /// State with no recorded history.
    pub fn empty() -> Self {
        Self::default()
    }

    /// State with the given applied revision versions.
    pub fn with_versions(versions: Vec<i64>) -> Self {
        Self { versions }
    }

    /// Returns true if no migration was ever recorded.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Applied revision versions, oldest first.
    pub fn versions(&self) -> &[i64] {
        &self.versions
    }
}

// =============================================================================
// Migration Engine Trait
// =============================================================================

/// Migration engine boundary.
#[async_trait]
pub trait MigrationEngine: Send + Sync {
    /// Reports the migration history currently recorded against `url`.
    ///
    /// An empty state means no migration was ever applied; a database whose
    /// bookkeeping table does not exist counts as empty.
    async fn current_state(&self, url: &str) -> Result<MigrationState>;

    /// Applies all pending migrations up to the latest revision (the head).
    async fn upgrade(&self, url: &str) -> Result<()>;

    /// Autogenerates a new revision named after `message` against the live
    /// database at `url`.
    ///
    /// # Returns
    ///
    /// The path of the created revision file.
    async fn autogenerate_revision(&self, url: &str, message: &str) -> Result<PathBuf>;
}

// =============================================================================
// Sqlx Engine
// =============================================================================

/// Production engine over sqlx's migrator and a filesystem migrations
/// directory.
pub struct SqlxMigrationEngine {
    migrations_dir: PathBuf,
}

impl SqlxMigrationEngine {
    /// Creates an engine over the given migrations directory.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// The migrations directory this engine reads and writes.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }
}

#[async_trait]
impl MigrationEngine for SqlxMigrationEngine {
    async fn current_state(&self, url: &str) -> Result<MigrationState> {
        let mut conn = PgConnection::connect(url)
            .await
            .map_err(|e| Error::MigrationApply(format!("cannot connect to target: {e}")))?;

        let state = match conn.list_applied_migrations().await {
            Ok(applied) => Ok(MigrationState::with_versions(
                applied.into_iter().map(|m| m.version).collect(),
            )),
            Err(MigrateError::Execute(sqlx::Error::Database(db)))
                if db.code().as_deref() == Some(SQLSTATE_UNDEFINED_TABLE) =>
            {
                Ok(MigrationState::empty())
            }
            Err(e) => Err(Error::MigrationApply(format!(
                "cannot read migration history: {e}"
            ))),
        };

        conn.close().await.ok();
        state
    }

    async fn upgrade(&self, url: &str) -> Result<()> {
        info!(dir = %self.migrations_dir.display(), "applying migrations");

        let migrator = Migrator::new(self.migrations_dir.as_path())
            .await
            .map_err(|e| {
                Error::MigrationApply(format!(
                    "cannot load migrations from {}: {e}",
                    self.migrations_dir.display()
                ))
            })?;

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(url)
            .await
            .map_err(|e| Error::MigrationApply(format!("cannot connect to target: {e}")))?;

        let outcome = migrator.run(&pool).await;
        pool.close().await;
        outcome.map_err(|e| Error::MigrationApply(e.to_string()))?;

        info!("migrations applied");
        Ok(())
    }

    async fn autogenerate_revision(&self, url: &str, message: &str) -> Result<PathBuf> {
        // The revision is authored against the live schema; an unreachable
        // target is an authoring error, not something to write a file for.
        let conn = PgConnection::connect(url)
            .await
            .map_err(|e| Error::MigrationGenerate(format!("cannot connect to target: {e}")))?;
        conn.close().await.ok();

        tokio::fs::create_dir_all(&self.migrations_dir)
            .await
            .map_err(|e| {
                Error::MigrationGenerate(format!(
                    "cannot create {}: {e}",
                    self.migrations_dir.display()
                ))
            })?;

        let version = Utc::now().format("%Y%m%d%H%M%S");
        let path = self
            .migrations_dir
            .join(format!("{version}_{}.sql", slugify(message)));

        let contents = format!("-- {message}\n\n-- Add migration script here\n");
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| Error::MigrationGenerate(format!("cannot write revision file: {e}")))?;

        debug!(path = %path.display(), "created revision file");
        Ok(path)
    }
}

/// Turns a revision message into a filename-safe slug.
fn slugify(message: &str) -> String {
    let mut slug = String::with_capacity(message.len());
    let mut last_was_sep = true;
    for c in message.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}
