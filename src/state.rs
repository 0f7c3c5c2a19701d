//! Circuit breaker state derivation.
//!
//! The breaker never stores its state. It is recomputed from the failure
//! bookkeeping on every read so it cannot go stale as time advances.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Represents the possible states of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Circuit is closed and operations are allowed.
    Closed,

    /// Circuit is open and operations are rejected until the reset timeout elapses.
    Open,

    /// Reset timeout has elapsed after tripping; a trial operation is allowed.
    HalfOpen,
}

impl State {
    /// Derives the state from failure bookkeeping at the instant `now`.
    ///
    /// The breaker is closed while `failure_count <= max_retries`. Past that it
    /// is open, unless more than `reset_timeout` has elapsed since the last
    /// failure, in which case it is half-open.
    pub fn derive(
        failure_count: u32,
        max_retries: u32,
        last_failure_at: Option<Instant>,
        reset_timeout: Duration,
        now: Instant,
    ) -> State {
        if failure_count <= max_retries {
            return State::Closed;
        }

        match last_failure_at {
            Some(at) if now.saturating_duration_since(at) > reset_timeout => State::HalfOpen,
            _ => State::Open,
        }
    }

    /// Whether `execute` performs a call attempt in this state.
    pub fn permits_call(self) -> bool {
        matches!(self, State::Closed | State::HalfOpen)
    }

    /// Lowercase label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            State::Closed => "closed",
            State::Open => "open",
            State::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESET: Duration = Duration::from_secs(2);

    #[test]
    fn closed_while_within_retry_budget() {
        let now = Instant::now();
        assert_eq!(State::derive(0, 2, None, RESET, now), State::Closed);
        assert_eq!(State::derive(2, 2, Some(now), RESET, now), State::Closed);
    }

    #[test]
    fn open_until_reset_timeout_elapses() {
        let at = Instant::now();
        assert_eq!(State::derive(3, 2, Some(at), RESET, at), State::Open);
        assert_eq!(State::derive(3, 2, Some(at), RESET, at + RESET), State::Open);
        assert_eq!(
            State::derive(3, 2, Some(at), RESET, at + RESET + Duration::from_millis(1)),
            State::HalfOpen
        );
    }

    #[test]
    fn open_without_failure_timestamp() {
        assert_eq!(State::derive(1, 0, None, RESET, Instant::now()), State::Open);
    }

    #[test]
    fn clock_skew_counts_as_no_elapsed_time() {
        let now = Instant::now();
        let later = now + Duration::from_secs(60);
        assert_eq!(State::derive(5, 1, Some(later), RESET, now), State::Open);
    }

    #[test]
    fn call_permission_and_labels() {
        assert!(State::Closed.permits_call());
        assert!(State::HalfOpen.permits_call());
        assert!(!State::Open.permits_call());
        assert_eq!(State::HalfOpen.to_string(), "half-open");
    }
}
