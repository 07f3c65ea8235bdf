//! Error kinds surfaced by the decoding engine.
//!
//! Three kinds reach the optimizer boundary:
//!
//! - **Configuration**: a mutation operator matches no stage of the chain.
//! - **Propagation**: a domain constraint cannot be satisfied given the
//!   current assignments. Expected during search and recoverable only by
//!   the init-opt path of the forward construction.
//! - **Invariant violation**: a defect in the dataset or chain (e.g. an
//!   alternative-job group with fewer than two members).

use thiserror::Error;

/// Errors produced while initializing or running a selector chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("propagation failure: {0}")]
    Propagation(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result alias used across the crate.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

impl ScheduleError {
    /// Creates a propagation failure.
    pub fn propagation(message: impl Into<String>) -> Self {
        Self::Propagation(message.into())
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Whether a caller may recover from this error by trying another
    /// assignment (only propagation failures qualify).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Propagation(_))
    }
}
