//! The probe engine.
//!
//! Runs the linear seed → execute → verify flow against a [`ProbeDriver`]
//! and guarantees the driver is released on every exit path. Provisioning
//! the deployment stays with the caller (it is fixture-scoped), with
//! [`provision`] enforcing the fatal-on-setup contract.

use crate::config::ProbeConfig;
use crate::deployment::Deployment;
use crate::driver::ProbeDriver;
use crate::error::{ProbeError, ProbeResult};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Starts a deployment and returns its endpoint.
///
/// Any failure here is a [`ProbeError::Setup`]: fatal, raised before the
/// probe body runs.
pub async fn provision<D: Deployment>(deployment: &mut D) -> ProbeResult<String> {
    deployment.start().await?;
    if !deployment.is_running() {
        return Err(ProbeError::setup("deployment did not reach the running state"));
    }
    deployment
        .endpoint()
        .ok_or_else(|| ProbeError::setup("deployment exposes no endpoint"))
}

/// Outcome of a successful probe run.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Endpoint the probe ran against.
    pub endpoint: String,
    /// Number of baseline documents seeded.
    pub seeded: usize,
    /// Receipt returned by the transaction executor.
    pub receipt: String,
    /// Committed run-marked documents per target.
    pub committed: Vec<(String, u64)>,
    /// Run marker stamped on this run's transactional writes.
    pub marker: String,
    /// Wall-clock time from seed through verify.
    pub elapsed: Duration,
}

/// Runs the write plan from a [`ProbeConfig`] against a driver.
///
/// Generic over the driver seam so the same engine runs against the real
/// database binding and the in-memory mock.
pub struct TransactionProbe<D: ProbeDriver> {
    config: ProbeConfig,
    driver: D,
}

impl<D: ProbeDriver> TransactionProbe<D> {
    /// Creates a probe over a connected driver.
    pub fn new(config: ProbeConfig, driver: D) -> Self {
        Self { config, driver }
    }

    /// The driver, for inspection after a run.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Runs the probe and releases the driver on every exit path.
    ///
    /// Each run stamps its transactional writes with a fresh marker. A
    /// probe failure takes precedence over a release failure; a release
    /// failure after a passing run still fails the probe.
    pub async fn run(&mut self) -> ProbeResult<ProbeReport> {
        let marker = Uuid::new_v4().to_string();
        let outcome = self.phases(&marker).await;
        let released = self.driver.close().await;
        match outcome {
            Ok(report) => released.map(|()| report),
            Err(err) => {
                if let Err(close_err) = released {
                    debug!(error = %close_err, "driver release failed after probe failure");
                }
                Err(err)
            }
        }
    }

    async fn phases(&mut self, marker: &str) -> ProbeResult<ProbeReport> {
        let started = Instant::now();

        debug!(%marker, "seeding baseline documents");
        for write in &self.config.seed {
            self.driver.seed(write).await?;
        }

        let script = self.config.script.stamped(marker);
        debug!(profile = ?self.config.profile, "executing transaction script");
        let receipt = self.driver.execute(&self.config.profile, &script).await?;
        if receipt != script.receipt() {
            return Err(ProbeError::assertion(script.receipt(), &receipt));
        }

        let mut committed = Vec::new();
        for target in script.targets() {
            let expected = script.writes_for(target) as u64;
            let actual = self.driver.committed(target, marker).await?;
            if actual != expected {
                return Err(ProbeError::assertion(
                    format!("{expected} committed document(s) in {target}"),
                    actual.to_string(),
                ));
            }
            committed.push((target.to_string(), actual));
        }

        info!(%receipt, elapsed = ?started.elapsed(), "transaction probe passed");
        Ok(ProbeReport {
            endpoint: self.driver.endpoint().to_string(),
            seeded: self.config.seed.len(),
            receipt,
            committed,
            marker: marker.to_string(),
            elapsed: started.elapsed(),
        })
    }
}
