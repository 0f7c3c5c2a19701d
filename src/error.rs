//! Error types for the circuit breaker library.

use thiserror::Error;

/// Result type for circuit breaker construction.
pub type BreakerResult<T> = Result<T, BreakerError>;

/// Errors raised by the breaker itself.
///
/// Errors reported by the guarded operation are never surfaced here; the
/// breaker only stores the most recent one for the trip hook.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BreakerError {
    /// No Tokio runtime was supplied and none is running on this thread.
    #[error("no Tokio runtime available to drive breaker timers")]
    NoRuntime,

    /// The configuration cannot produce a working breaker.
    #[error("invalid breaker configuration: {0}")]
    InvalidConfig(&'static str),
}
