//! Bounded wait for database readiness.
//!
//! The waiter polls a [`ConnectivityProbe`] at a fixed interval until a
//! probe succeeds or the timeout budget is exhausted. The budget is measured
//! from the start of the loop, never reset per attempt. Only
//! [`ProbeError::Unreachable`] failures are retried; anything else aborts
//! the wait immediately so configuration mistakes are not silently polled
//! against for a full minute.
//!
//! Time is taken from `tokio::time`, so tests drive the loop under a paused
//! clock without real sleeping.
//!
//! [`ProbeError::Unreachable`]: crate::probe::ProbeError::Unreachable

use crate::constants::PROBE_POLL_INTERVAL;
use crate::error::{Error, Result};
use crate::probe::{ConnectivityProbe, ProbeError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Polls a connectivity probe until success or timeout.
pub struct ReadinessWaiter {
    probe: Arc<dyn ConnectivityProbe>,
    interval: Duration,
}

impl ReadinessWaiter {
    /// Creates a waiter with the default poll interval.
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self::with_interval(probe, PROBE_POLL_INTERVAL)
    }

    /// Creates a waiter with a custom poll interval.
    pub fn with_interval(probe: Arc<dyn ConnectivityProbe>, interval: Duration) -> Self {
        Self { probe, interval }
    }

    /// Blocks until `url` accepts a connection or `timeout` has elapsed
    /// since the first attempt.
    ///
    /// Returns as soon as a probe succeeds; no extra polling happens after
    /// success.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectivityTimeout`] once elapsed time reaches `timeout`
    ///   with every attempt unreachable
    /// - [`Error::Probe`] immediately on any non-transient probe failure
    pub async fn wait(&self, url: &str, timeout: Duration) -> Result<()> {
        info!(timeout = ?timeout, "waiting for database connection");
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match self.probe.probe(url).await {
                Ok(()) => {
                    info!(attempts, elapsed = ?start.elapsed(), "database is ready");
                    return Ok(());
                }
                Err(ProbeError::Unreachable(reason)) => {
                    debug!(attempts, %reason, "database not ready yet");
                    if start.elapsed() >= timeout {
                        return Err(Error::ConnectivityTimeout {
                            url: url.to_string(),
                            timeout,
                        });
                    }
                    sleep(self.interval).await;
                }
                Err(ProbeError::Fatal(reason)) => {
                    return Err(Error::Probe {
                        url: url.to_string(),
                        reason,
                    });
                }
            }
        }
    }
}
