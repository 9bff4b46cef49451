//! Error types for the probe harness.

use thiserror::Error;

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during a probe run.
///
/// The taxonomy separates failures by where they surface: bringing up the
/// deployment or client (`Setup`), non-transactional driver operations
/// (`Driver`), the session transaction executor (`Transaction`), and the
/// probe's own verification (`Assertion`).
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The deployment or client could not be brought up. Fatal; raised
    /// before the probe body runs.
    #[error("setup failed: {message}")]
    Setup {
        /// Description of what failed to come up.
        message: String,
    },

    /// A driver operation outside any transaction failed (seeding,
    /// counting, releasing).
    #[error("driver error: {message}")]
    Driver {
        /// Description of the failed operation.
        message: String,
        /// The underlying driver fault, if any.
        #[source]
        source: Option<Cause>,
    },

    /// The transaction executor failed after exhausting its internal
    /// retries. The original fault is preserved as the error source.
    #[error("transaction failed: {message}")]
    Transaction {
        /// Message carried over from the executor fault.
        message: String,
        /// The original executor fault, if any.
        #[source]
        source: Option<Cause>,
    },

    /// A verified value did not match what the probe expected.
    #[error("assertion failed: expected {expected}, got {actual}")]
    Assertion {
        /// What the probe expected.
        expected: String,
        /// What the probe observed.
        actual: String,
    },
}

impl ProbeError {
    /// Creates a setup error.
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }

    /// Creates a driver error with no underlying cause.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a driver error wrapping an underlying cause.
    pub fn driver_with(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::Driver {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a transaction error with no underlying cause.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transaction error wrapping the original executor fault.
    pub fn transaction_with(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::Transaction {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an assertion error.
    pub fn assertion(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Assertion {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Returns true for setup failures.
    pub fn is_setup(&self) -> bool {
        matches!(self, ProbeError::Setup { .. })
    }

    /// Returns true for transaction executor failures.
    pub fn is_transaction(&self) -> bool {
        matches!(self, ProbeError::Transaction { .. })
    }

    /// Returns true for verification failures.
    pub fn is_assertion(&self) -> bool {
        matches!(self, ProbeError::Assertion { .. })
    }
}
