//! Driver seam and the in-memory mock.
//!
//! A probe driver performs the seeded and transactional writes against one
//! deployment. The real implementation (in the mongo binding crate) wraps
//! the database driver's session transaction executor; [`MockDriver`]
//! interprets scripts against an in-memory store so the engine's behavior
//! can be exercised without a container.

use crate::error::{ProbeError, ProbeResult};
use crate::profile::TxnProfile;
use crate::script::{DocumentWrite, TxnScript, WriteTarget};
use serde_json::Value;
use std::collections::HashMap;

/// Performs writes against one deployment on behalf of the probe.
#[allow(async_fn_in_trait)]
pub trait ProbeDriver {
    /// The endpoint this driver is bound to.
    fn endpoint(&self) -> &str;

    /// Inserts one document with majority durability, outside any session.
    async fn seed(&mut self, write: &DocumentWrite) -> ProbeResult<()>;

    /// Runs the script inside a session transaction and returns its
    /// receipt. The executor retries the script transparently on transient
    /// errors; a failure after retries are exhausted surfaces as a
    /// [`ProbeError::Transaction`] wrapping the original fault.
    async fn execute(&mut self, profile: &TxnProfile, script: &TxnScript) -> ProbeResult<String>;

    /// Counts committed documents carrying the given run marker.
    async fn committed(&mut self, target: &WriteTarget, marker: &str) -> ProbeResult<u64>;

    /// Releases the driver. Idempotent; called on every exit path.
    async fn close(&mut self) -> ProbeResult<()>;
}

/// An in-memory driver for tests.
///
/// Transactions are modeled the way the server behaves: each execute
/// attempt stages its writes, a transient abort discards the staged writes
/// before the retry, and only the final attempt commits to the store.
#[derive(Debug, Default)]
pub struct MockDriver {
    store: HashMap<String, Vec<Value>>,
    transient_aborts: u32,
    seed_failure: Option<String>,
    execute_failure: Option<String>,
    receipt_override: Option<String>,
    closed: bool,
    seeds: u32,
    attempts: u32,
}

impl MockDriver {
    /// Creates an empty mock driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aborts the first `count` execute attempts with a transient error
    /// before letting one commit.
    #[must_use]
    pub fn with_transient_aborts(mut self, count: u32) -> Self {
        self.transient_aborts = count;
        self
    }

    /// Makes every seed fail with the given message.
    #[must_use]
    pub fn with_seed_failure(mut self, message: impl Into<String>) -> Self {
        self.seed_failure = Some(message.into());
        self
    }

    /// Makes execute fail hard (after any configured transient aborts).
    #[must_use]
    pub fn with_execute_failure(mut self, message: impl Into<String>) -> Self {
        self.execute_failure = Some(message.into());
        self
    }

    /// Makes execute return the given receipt instead of the script's.
    #[must_use]
    pub fn with_receipt_override(mut self, receipt: impl Into<String>) -> Self {
        self.receipt_override = Some(receipt.into());
        self
    }

    /// Number of execute attempts, aborted ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of seed inserts performed.
    pub fn seeds(&self) -> u32 {
        self.seeds
    }

    /// Whether the driver has been released.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Documents committed to the given target, seeds included.
    pub fn documents(&self, target: &WriteTarget) -> &[Value] {
        self.store
            .get(&target.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn ensure_open(&self) -> ProbeResult<()> {
        if self.closed {
            return Err(ProbeError::driver("driver is closed"));
        }
        Ok(())
    }
}

impl ProbeDriver for MockDriver {
    fn endpoint(&self) -> &str {
        "mongodb://mock.local:27017/?directConnection=true"
    }

    async fn seed(&mut self, write: &DocumentWrite) -> ProbeResult<()> {
        self.ensure_open()?;
        if let Some(message) = &self.seed_failure {
            return Err(ProbeError::driver(message.clone()));
        }
        self.seeds += 1;
        self.store
            .entry(write.target.to_string())
            .or_default()
            .push(write.body.clone());
        Ok(())
    }

    async fn execute(&mut self, _profile: &TxnProfile, script: &TxnScript) -> ProbeResult<String> {
        self.ensure_open()?;
        loop {
            self.attempts += 1;
            let staged: Vec<(String, Value)> = script
                .writes()
                .iter()
                .map(|write| (write.target.to_string(), write.body.clone()))
                .collect();

            if self.transient_aborts > 0 {
                // Rolled back with the aborted transaction.
                self.transient_aborts -= 1;
                drop(staged);
                continue;
            }
            if let Some(message) = &self.execute_failure {
                return Err(ProbeError::transaction(message.clone()));
            }

            for (key, body) in staged {
                self.store.entry(key).or_default().push(body);
            }
            return Ok(self
                .receipt_override
                .clone()
                .unwrap_or_else(|| script.receipt().to_string()));
        }
    }

    async fn committed(&mut self, target: &WriteTarget, marker: &str) -> ProbeResult<u64> {
        self.ensure_open()?;
        let count = self
            .store
            .get(&target.to_string())
            .map(|docs| {
                docs.iter()
                    .filter(|doc| doc.get("run").and_then(Value::as_str) == Some(marker))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn script() -> TxnScript {
        TxnScript::new("done")
            .with_write(WriteTarget::new("mydb1", "foo"), json!({ "abc": 1 }))
            .with_write(WriteTarget::new("mydb2", "bar"), json!({ "xyz": 999 }))
    }

    #[tokio::test]
    async fn commits_once_despite_transient_aborts() {
        let mut driver = MockDriver::new().with_transient_aborts(2);
        let stamped = script().stamped("run-1");

        let receipt = driver
            .execute(&TxnProfile::safe(), &stamped)
            .await
            .unwrap();

        assert_eq!(receipt, "done");
        assert_eq!(driver.attempts(), 3);
        for target in stamped.targets() {
            assert_eq!(driver.committed(target, "run-1").await.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn hard_failure_commits_nothing() {
        let mut driver = MockDriver::new().with_execute_failure("write conflict");

        let err = driver
            .execute(&TxnProfile::safe(), &script())
            .await
            .unwrap_err();

        assert!(err.is_transaction());
        assert!(driver.documents(&WriteTarget::new("mydb1", "foo")).is_empty());
    }

    #[tokio::test]
    async fn marker_filter_ignores_seeds_and_other_runs() {
        let mut driver = MockDriver::new();
        let target = WriteTarget::new("mydb1", "foo");
        driver
            .seed(&DocumentWrite::new(target.clone(), json!({ "abc": 0 })))
            .await
            .unwrap();

        driver
            .execute(&TxnProfile::safe(), &script().stamped("run-1"))
            .await
            .unwrap();
        driver
            .execute(&TxnProfile::safe(), &script().stamped("run-2"))
            .await
            .unwrap();

        assert_eq!(driver.committed(&target, "run-1").await.unwrap(), 1);
        assert_eq!(driver.documents(&target).len(), 3);
    }

    #[tokio::test]
    async fn closed_driver_rejects_operations() {
        let mut driver = MockDriver::new();
        driver.close().await.unwrap();
        driver.close().await.unwrap();

        let err = driver
            .seed(&DocumentWrite::new(
                WriteTarget::new("mydb1", "foo"),
                json!({ "abc": 0 }),
            ))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("closed"));
    }
}
