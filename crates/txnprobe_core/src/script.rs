//! Write targets and transaction scripts.
//!
//! A `TxnScript` is the probe's unit-of-work expressed as data: an ordered
//! list of document writes plus the receipt returned when the transaction
//! commits. Keeping it a value object (rather than a closure) lets the
//! transaction executor replay it safely on transient retries and lets the
//! mock driver interpret it without a server.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A (database, collection) pair addressed by a write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WriteTarget {
    /// Database name.
    pub database: String,
    /// Collection name.
    pub collection: String,
}

impl WriteTarget {
    /// Creates a new write target.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// One document insert against a target.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
    /// Where the document goes.
    pub target: WriteTarget,
    /// The document body. Must be a JSON object to be insertable.
    pub body: Value,
}

impl DocumentWrite {
    /// Creates a new document write.
    pub fn new(target: WriteTarget, body: Value) -> Self {
        Self { target, body }
    }
}

/// The transactional unit-of-work: ordered writes plus the receipt the
/// executor returns on commit.
///
/// The executor may invoke the script more than once on transient errors;
/// every aborted attempt's writes are rolled back with its transaction, so
/// replaying the same script is safe under at-least-once execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TxnScript {
    writes: Vec<DocumentWrite>,
    receipt: String,
}

impl TxnScript {
    /// Creates an empty script that returns the given receipt on commit.
    pub fn new(receipt: impl Into<String>) -> Self {
        Self {
            writes: Vec::new(),
            receipt: receipt.into(),
        }
    }

    /// Appends a write to the script.
    #[must_use]
    pub fn with_write(mut self, target: WriteTarget, body: Value) -> Self {
        self.writes.push(DocumentWrite::new(target, body));
        self
    }

    /// The writes, in execution order.
    pub fn writes(&self) -> &[DocumentWrite] {
        &self.writes
    }

    /// The receipt returned when the script commits.
    pub fn receipt(&self) -> &str {
        &self.receipt
    }

    /// Distinct targets touched by the script, in first-write order.
    pub fn targets(&self) -> Vec<&WriteTarget> {
        let mut targets: Vec<&WriteTarget> = Vec::new();
        for write in &self.writes {
            if !targets.contains(&&write.target) {
                targets.push(&write.target);
            }
        }
        targets
    }

    /// Number of writes addressed to the given target.
    pub fn writes_for(&self, target: &WriteTarget) -> usize {
        self.writes.iter().filter(|w| w.target == *target).count()
    }

    /// Returns a copy of the script with every object body stamped with the
    /// given run marker under the `"run"` key. Markers let the verify phase
    /// count exactly the documents one probe run committed, even against a
    /// shared deployment.
    #[must_use]
    pub fn stamped(&self, marker: &str) -> Self {
        let mut stamped = self.clone();
        for write in &mut stamped.writes {
            if let Value::Object(body) = &mut write.body {
                body.insert("run".to_string(), Value::String(marker.to_string()));
            }
        }
        stamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_database_script() -> TxnScript {
        TxnScript::new("done")
            .with_write(WriteTarget::new("mydb1", "foo"), json!({ "abc": 1 }))
            .with_write(WriteTarget::new("mydb2", "bar"), json!({ "xyz": 999 }))
    }

    #[test]
    fn target_display() {
        let target = WriteTarget::new("mydb1", "foo");
        assert_eq!(target.to_string(), "mydb1.foo");
    }

    #[test]
    fn script_collects_distinct_targets_in_order() {
        let script = two_database_script()
            .with_write(WriteTarget::new("mydb1", "foo"), json!({ "abc": 2 }));

        let targets = script.targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].to_string(), "mydb1.foo");
        assert_eq!(targets[1].to_string(), "mydb2.bar");
        assert_eq!(script.writes_for(targets[0]), 2);
        assert_eq!(script.writes_for(targets[1]), 1);
    }

    #[test]
    fn stamping_adds_marker_and_keeps_fields() {
        let script = two_database_script().stamped("run-42");

        for write in script.writes() {
            assert_eq!(write.body["run"], "run-42");
        }
        assert_eq!(script.writes()[0].body["abc"], 1);
        assert_eq!(script.writes()[1].body["xyz"], 999);
        assert_eq!(script.receipt(), "done");
    }

    #[test]
    fn stamping_does_not_mutate_the_original() {
        let script = two_database_script();
        let _ = script.stamped("run-42");
        assert!(script.writes()[0].body.get("run").is_none());
    }
}
