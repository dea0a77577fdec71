//! Migration safety guard.
//!
//! The guard sits between the orchestration flows and the migration engine's
//! apply operation. Before applying anything it queries the engine for the
//! target's recorded history: any prior history means the user pointed the
//! tool at an existing, already-migrated database, and the guard refuses
//! rather than double-apply.
//!
//! Revision *generation* is not guarded — authoring a new revision after
//! migrations exist is the normal workflow.
//!
//! The check-then-apply sequence is not atomic against concurrent external
//! mutation; single-operator, single-process usage is assumed.

use crate::error::{Error, Result};
use crate::migrate::MigrationEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Guards the apply workflow against double-initializing a database.
pub struct MigrationGuard {
    engine: Arc<dyn MigrationEngine>,
}

impl MigrationGuard {
    /// Creates a guard over the given engine.
    pub fn new(engine: Arc<dyn MigrationEngine>) -> Self {
        Self { engine }
    }

    /// Applies all pending migrations to `url`, unless the database already
    /// has migration history.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyMigrated`] when any prior history is recorded; the
    /// upgrade is never invoked in that case.
    pub async fn check_and_apply(&self, url: &str) -> Result<()> {
        let state = self.engine.current_state(url).await?;
        if !state.is_empty() {
            warn!(
                revisions = state.versions().len(),
                "migration history already present, refusing to apply"
            );
            return Err(Error::AlreadyMigrated {
                url: url.to_string(),
            });
        }

        info!("no migration history, applying pending migrations");
        self.engine.upgrade(url).await
    }

    /// Autogenerates a new revision named `message` from the live schema at
    /// `url`. Deliberately unguarded.
    pub async fn create_revision(&self, url: &str, message: &str) -> Result<PathBuf> {
        info!(%message, "creating migration revision");
        self.engine.autogenerate_revision(url, message).await
    }
}
