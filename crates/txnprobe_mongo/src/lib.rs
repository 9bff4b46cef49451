//! # txnprobe mongo
//!
//! MongoDB bindings for the txnprobe harness.
//!
//! This crate provides:
//! - [`MongoReplica`]: an ephemeral single-node replica-set container,
//!   started and stopped through the container orchestration library
//! - [`MongoDriver`]: a [`ProbeDriver`](txnprobe_core::ProbeDriver) built
//!   on the official driver, running scripts through the driver's session
//!   transaction executor (which retries transiently failing attempts)
//!
//! Container-backed integration tests live in `tests/` and need a local
//! Docker daemon.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod container;
mod driver;

pub use container::{MongoReplica, DEFAULT_IMAGE_TAG};
pub use driver::MongoDriver;
