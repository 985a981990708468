//! Help desk error types.
//!
//! Resource contention (no free chair, an empty priority queue at dispatch
//! time) is not represented here: those outcomes are resolved by re-looping
//! and never reach a caller.

use crate::config::ConfigError;
use thiserror::Error;

/// Help desk error type.
///
/// Every variant except `Config` aborts a running simulation: the actor that
/// observes it returns the error and the driver cancels all other actors.
#[derive(Debug, Error)]
pub enum HelpDeskError {
    /// Startup configuration rejected before any actor was launched.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A synchronization contract was broken (chair count out of range,
    /// queue corruption, double dispatch).
    #[error("Invariant violated: {0}")]
    InvariantViolated(String),

    /// A counting signal was closed while an actor waited on it.
    #[error("Signal closed: {0}")]
    SignalClosed(&'static str),

    /// An actor task panicked or was aborted.
    #[error("Actor task failed: {0}")]
    ActorPanicked(String),

    /// The optional run deadline elapsed before all actors finished.
    #[error("Run exceeded deadline of {0:?}")]
    DeadlineExceeded(std::time::Duration),

    /// The actor was cancelled because another actor failed.
    #[error("Cancelled")]
    Cancelled,
}

impl HelpDeskError {
    /// Whether this error is a consequence of another actor's failure rather
    /// than a root cause.
    #[must_use]
    pub fn is_secondary(&self) -> bool {
        matches!(self, HelpDeskError::Cancelled)
    }

    /// Process exit status for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            HelpDeskError::Config(_) => 2,
            HelpDeskError::DeadlineExceeded(_) => 3,
            HelpDeskError::InvariantViolated(_)
            | HelpDeskError::SignalClosed(_)
            | HelpDeskError::ActorPanicked(_)
            | HelpDeskError::Cancelled => 1,
        }
    }
}

/// Shorthand for building an invariant violation.
pub(crate) fn invariant(message: impl Into<String>) -> HelpDeskError {
    HelpDeskError::InvariantViolated(message.into())
}
