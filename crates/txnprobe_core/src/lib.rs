//! # txnprobe core
//!
//! Driver-agnostic core of the txnprobe harness.
//!
//! This crate provides:
//! - Probe configuration with the default multi-database write plan
//! - Transaction profiles (read routing, read isolation, write durability)
//! - Write scripts: the transactional unit-of-work as an explicit command object
//! - The `Deployment` and `ProbeDriver` seams with in-memory mocks
//! - The phase-ordered `TransactionProbe` engine
//!
//! ## Architecture
//!
//! A probe run is strictly linear:
//!
//! 1. **Provision** a deployment and obtain its endpoint
//! 2. **Seed** baseline documents with majority durability, outside any session
//! 3. **Configure** an immutable transaction profile
//! 4. **Execute** the write script inside a session transaction
//! 5. **Verify** the returned receipt and the committed state
//! 6. **Release** the driver on every exit path
//!
//! Transient-error retry of the script belongs to the driver's transaction
//! executor, never to this crate.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod deployment;
mod driver;
mod error;
mod probe;
mod profile;
mod script;

pub use config::{ProbeConfig, DEFAULT_RECEIPT};
pub use deployment::{Deployment, DeploymentState, MockDeployment};
pub use driver::{MockDriver, ProbeDriver};
pub use error::{ProbeError, ProbeResult};
pub use probe::{provision, ProbeReport, TransactionProbe};
pub use profile::{ReadIsolation, ReadRoute, TxnProfile, WriteAck};
pub use script::{DocumentWrite, TxnScript, WriteTarget};
