//! Transaction profiles.
//!
//! A profile is an immutable value object describing how the transaction
//! reads and writes: where reads are routed, the isolation requested for
//! reads, and the durability required for writes. It is built once before
//! the execute phase and never mutated afterwards.

use std::time::Duration;

/// Where reads inside the transaction are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRoute {
    /// Route every read to the primary.
    Primary,
    /// Prefer the primary, fall back to a secondary.
    PrimaryPreferred,
    /// Route reads to a secondary.
    Secondary,
    /// Prefer a secondary, fall back to the primary.
    SecondaryPreferred,
    /// Route reads to the lowest-latency member.
    Nearest,
}

/// Isolation requested for reads inside the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadIsolation {
    /// Return the node's most recent data, committed or not.
    Local,
    /// Return only majority-committed data.
    Majority,
    /// Read from a majority-committed snapshot.
    Snapshot,
}

/// Durability required for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAck {
    /// Acknowledged by a majority of the replica set.
    Majority,
    /// Acknowledged by a fixed number of members.
    Nodes(u32),
}

/// An immutable transaction profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxnProfile {
    /// Read routing.
    pub read_route: ReadRoute,
    /// Read isolation.
    pub read_isolation: ReadIsolation,
    /// Write durability.
    pub write_ack: WriteAck,
    /// Optional upper bound on commit time.
    pub max_commit_time: Option<Duration>,
}

impl TxnProfile {
    /// The combination safe for transactions that must be both consistent
    /// and durable: primary reads, local isolation, majority-acknowledged
    /// writes.
    #[must_use]
    pub fn safe() -> Self {
        Self {
            read_route: ReadRoute::Primary,
            read_isolation: ReadIsolation::Local,
            write_ack: WriteAck::Majority,
            max_commit_time: None,
        }
    }

    /// Sets the read routing.
    #[must_use]
    pub fn with_read_route(mut self, route: ReadRoute) -> Self {
        self.read_route = route;
        self
    }

    /// Sets the read isolation.
    #[must_use]
    pub fn with_read_isolation(mut self, isolation: ReadIsolation) -> Self {
        self.read_isolation = isolation;
        self
    }

    /// Sets the write durability.
    #[must_use]
    pub fn with_write_ack(mut self, ack: WriteAck) -> Self {
        self.write_ack = ack;
        self
    }

    /// Bounds the commit time.
    #[must_use]
    pub fn with_max_commit_time(mut self, bound: Duration) -> Self {
        self.max_commit_time = Some(bound);
        self
    }
}

impl Default for TxnProfile {
    fn default() -> Self {
        Self::safe()
    }
}
