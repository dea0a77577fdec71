//! Database connectivity probing.
//!
//! A probe opens a single connection to the database endpoint and
//! immediately releases it. Probes never retry — bounded retrying is
//! [`crate::readiness::ReadinessWaiter`]'s responsibility — but they do
//! classify failures so the waiter can tell a database that is still
//! starting up from one that will never accept this configuration.

use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::debug;

/// Postgres SQLSTATE for "the database system is starting up".
///
/// Emitted while the server process is up but not yet accepting ordinary
/// connections; counts as transient.
const SQLSTATE_CANNOT_CONNECT_NOW: &str = "57P03";

// =============================================================================
// Probe Outcome
// =============================================================================

/// A classified probe failure.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The endpoint did not accept a connection. Transient while a container
    /// is starting; the waiter retries these.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The probe failed for a reason retrying cannot fix (malformed URL,
    /// authentication failure). The waiter propagates these immediately.
    #[error("{0}")]
    Fatal(String),
}

/// Result of a single probe attempt.
pub type ProbeResult = std::result::Result<(), ProbeError>;

// =============================================================================
// Connectivity Probe Trait
// =============================================================================

/// A single-shot connection attempt against a database endpoint.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Opens one connection to `url` and immediately releases it.
    async fn probe(&self, url: &str) -> ProbeResult;
}

// =============================================================================
// Postgres Probe
// =============================================================================

/// Production probe: one Postgres connection, opened and closed.
#[derive(Debug, Default)]
pub struct PgProbe;

impl PgProbe {
    /// Creates a new Postgres probe.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectivityProbe for PgProbe {
    async fn probe(&self, url: &str) -> ProbeResult {
        match PgConnection::connect(url).await {
            Ok(conn) => {
                // Release immediately; a close failure after a successful
                // open still proves reachability.
                conn.close().await.ok();
                Ok(())
            }
            Err(e) => Err(classify(e)),
        }
    }
}

/// Classifies a connection failure as transient or fatal.
fn classify(err: sqlx::Error) -> ProbeError {
    match &err {
        sqlx::Error::Io(io) => {
            debug!(error = %io, "probe I/O failure");
            ProbeError::Unreachable(io.to_string())
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some(SQLSTATE_CANNOT_CONNECT_NOW) => {
            ProbeError::Unreachable(db.to_string())
        }
        _ => ProbeError::Fatal(err.to_string()),
    }
}
