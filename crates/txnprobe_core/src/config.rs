//! Probe configuration.

use crate::profile::TxnProfile;
use crate::script::{DocumentWrite, TxnScript, WriteTarget};
use serde_json::json;
use std::time::Duration;

/// Receipt returned by the default script when its transaction commits.
pub const DEFAULT_RECEIPT: &str = "Inserted into collections in different databases";

/// Configuration for a probe run.
///
/// The default plan seeds one document into each of two collections in two
/// databases, then inserts one more into each inside a single transaction
/// and returns [`DEFAULT_RECEIPT`].
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Baseline inserts performed with majority durability, outside any
    /// session, before the transactional phase.
    pub seed: Vec<DocumentWrite>,
    /// The transactional unit-of-work.
    pub script: TxnScript,
    /// Transaction profile used for the execute phase.
    pub profile: TxnProfile,
    /// TCP connect timeout for the client.
    pub connect_timeout: Duration,
    /// Upper bound on server selection, so an unreachable deployment fails
    /// fast instead of hanging the probe.
    pub server_selection_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let first = WriteTarget::new("mydb1", "foo");
        let second = WriteTarget::new("mydb2", "bar");

        Self {
            seed: vec![
                DocumentWrite::new(first.clone(), json!({ "abc": 0 })),
                DocumentWrite::new(second.clone(), json!({ "xyz": 0 })),
            ],
            script: TxnScript::new(DEFAULT_RECEIPT)
                .with_write(first, json!({ "abc": 1 }))
                .with_write(second, json!({ "xyz": 999 })),
            profile: TxnProfile::safe(),
            connect_timeout: Duration::from_secs(10),
            server_selection_timeout: Duration::from_secs(10),
        }
    }
}

impl ProbeConfig {
    /// Creates a configuration with the default plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the seed writes.
    #[must_use]
    pub fn with_seed(mut self, seed: Vec<DocumentWrite>) -> Self {
        self.seed = seed;
        self
    }

    /// Replaces the transactional script.
    #[must_use]
    pub fn with_script(mut self, script: TxnScript) -> Self {
        self.script = script;
        self
    }

    /// Replaces the transaction profile.
    #[must_use]
    pub fn with_profile(mut self, profile: TxnProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the server selection timeout.
    #[must_use]
    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan() {
        let config = ProbeConfig::default();

        assert_eq!(config.seed.len(), 2);
        assert_eq!(config.seed[0].target.to_string(), "mydb1.foo");
        assert_eq!(config.seed[1].target.to_string(), "mydb2.bar");
        assert_eq!(config.seed[0].body["abc"], 0);
        assert_eq!(config.seed[1].body["xyz"], 0);

        let targets = config.script.targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(config.script.writes()[0].body["abc"], 1);
        assert_eq!(config.script.writes()[1].body["xyz"], 999);
        assert_eq!(config.script.receipt(), DEFAULT_RECEIPT);
    }

    #[test]
    fn builder_pattern() {
        let config = ProbeConfig::new()
            .with_script(TxnScript::new("other receipt"))
            .with_server_selection_timeout(Duration::from_millis(500));

        assert_eq!(config.script.receipt(), "other receipt");
        assert_eq!(config.server_selection_timeout, Duration::from_millis(500));
        // Untouched fields keep their defaults.
        assert_eq!(config.seed.len(), 2);
    }
}
