//! Metric sinks for circuit breaker events.

use std::time::Duration;

use crate::state::State;

/// Trait for metrics sinks that can receive circuit breaker events.
///
/// Events are reported after the breaker has released its internal lock, in
/// the order they happen.
pub trait MetricSink: Send + Sync + 'static {
    /// Records a call attempt made in `state`.
    fn record_call_attempt(&self, state: State);

    /// Records a reported success.
    fn record_success(&self);

    /// Records a failure. `timed_out` is set when no outcome was reported
    /// within the call timeout.
    fn record_failure(&self, timed_out: bool, failure_count: u32);

    /// Records an automatic retry scheduled after `delay`.
    fn record_retry_scheduled(&self, delay: Duration);

    /// Records a trip notification.
    fn record_trip(&self, failure_count: u32);

    /// Records an explicit reset.
    fn record_reset(&self);
}

/// A null metrics sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetricSink;

impl MetricSink for NullMetricSink {
    fn record_call_attempt(&self, _state: State) {}
    fn record_success(&self) {}
    fn record_failure(&self, _timed_out: bool, _failure_count: u32) {}
    fn record_retry_scheduled(&self, _delay: Duration) {}
    fn record_trip(&self, _failure_count: u32) {}
    fn record_reset(&self) {}
}
