//! Core circuit breaker implementation.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::config::{BreakerBuilder, BreakerConfig};
use crate::hook::HookRegistry;
use crate::metrics::MetricSink;
use crate::state::State;
use crate::timer::{Ticket, Timer};

/// The most recent recorded failure.
struct LastFailure<E> {
    at: Instant,
    error: Option<Arc<E>>,
}

/// Mutable bookkeeping, guarded by the breaker's lock.
struct Core<E> {
    failure_count: u32,
    last_failure: Option<LastFailure<E>>,
    timer: Timer,
}

impl<E> Core<E> {
    fn state(&self, config: &BreakerConfig) -> State {
        State::derive(
            self.failure_count,
            config.max_retries,
            self.last_failure.as_ref().map(|failure| failure.at),
            config.reset_timeout,
            Instant::now(),
        )
    }

    fn clear(&mut self) {
        self.timer.cancel();
        self.failure_count = 0;
        self.last_failure = None;
    }
}

/// What a fired timer does.
#[derive(Debug, Clone, Copy)]
enum Deferred {
    /// The attempt produced no outcome in time.
    Timeout,
    /// Start the next attempt after backoff.
    Retry,
}

/// Result of recording a failure, reported once the lock is released.
struct FailureOutcome {
    failure_count: u32,
    state: State,
    retry_delay: Option<Duration>,
}

/// Work left for a fired timer after its ticket is claimed.
enum Fired {
    TimedOut(FailureOutcome),
    Retry(State),
}

/// Inner state of the circuit breaker, shared between handles.
struct BreakerInner<E> {
    config: BreakerConfig,
    core: Mutex<Core<E>>,
    hooks: HookRegistry<E>,
    metric_sink: Arc<dyn MetricSink>,
}

/// A circuit breaker guarding a callback-style operation.
///
/// The operation is supplied as the `on_call` hook. It receives a handle to
/// the breaker and reports its outcome, possibly later from another task, via
/// [`success`](Breaker::success) or [`failure`](Breaker::failure). Failures
/// below the retry budget schedule an automatic retry; the failure that
/// exceeds it trips the breaker and notifies the `on_trip` hook.
///
/// Handles are cheap to clone. Dropping the last one cancels any pending
/// timeout or retry. None of the operations block.
pub struct Breaker<E> {
    inner: Arc<BreakerInner<E>>,
}

impl<E> Breaker<E>
where
    E: Send + Sync + 'static,
{
    pub(crate) fn new(
        config: BreakerConfig,
        hooks: HookRegistry<E>,
        metric_sink: Arc<dyn MetricSink>,
        runtime: Handle,
    ) -> Self {
        let inner = BreakerInner {
            config,
            core: Mutex::new(Core {
                failure_count: 0,
                last_failure: None,
                timer: Timer::new(runtime),
            }),
            hooks,
            metric_sink,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Creates a new builder for customizing a breaker.
    pub fn builder() -> BreakerBuilder<E> {
        BreakerBuilder::new()
    }

    /// Gets the current state, derived at the time of the call.
    pub fn state(&self) -> State {
        self.inner.core.lock().state(&self.inner.config)
    }

    /// Gets the number of failures since the last success or reset.
    pub fn failure_count(&self) -> u32 {
        self.inner.core.lock().failure_count
    }

    /// Gets the error of the most recent failure, if it carried one.
    pub fn last_error(&self) -> Option<Arc<E>> {
        self.inner
            .core
            .lock()
            .last_failure
            .as_ref()
            .and_then(|failure| failure.error.clone())
    }

    /// Gets the time of the most recent failure.
    pub fn last_failure_at(&self) -> Option<Instant> {
        self.inner
            .core
            .lock()
            .last_failure
            .as_ref()
            .map(|failure| failure.at)
    }

    /// Whether a timeout or retry is currently scheduled.
    pub fn has_pending_timer(&self) -> bool {
        self.inner.core.lock().timer.is_pending()
    }

    /// Gets the breaker's configuration.
    pub fn config(&self) -> &BreakerConfig {
        &self.inner.config
    }

    /// Gets the breaker's name.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Gets the hook registry, to install or replace hooks.
    pub fn hooks(&self) -> &HookRegistry<E> {
        &self.inner.hooks
    }

    /// Runs the guarded operation, or trips if the breaker is open.
    ///
    /// Any pending timeout or retry is cancelled first.
    pub fn execute(&self) {
        let state = {
            let mut core = self.inner.core.lock();
            core.timer.cancel();
            core.state(&self.inner.config)
        };

        if state.permits_call() {
            self.attempt(state);
        } else {
            tracing::debug!(breaker = %self.name(), "Execute refused, breaker is open");
            self.trip();
        }
    }

    /// Reports that the guarded operation succeeded.
    ///
    /// Clears all failure bookkeeping and cancels any pending timer.
    pub fn success(&self) {
        let previous = {
            let mut core = self.inner.core.lock();
            let previous = core.failure_count;
            core.clear();
            previous
        };

        tracing::debug!(breaker = %self.name(), previous_failures = previous, "Call succeeded");
        self.inner.metric_sink.record_success();
    }

    /// Reports that the guarded operation failed.
    ///
    /// `error` is stored opaquely and handed to the trip hook. While the
    /// breaker stays closed a retry is scheduled; once the count exceeds the
    /// retry budget the breaker trips instead.
    pub fn failure(&self, error: Option<E>) {
        self.record_failure(error, false);
    }

    /// Clears all failure bookkeeping and cancels any pending timer.
    ///
    /// May be called at any time, including from the trip hook.
    pub fn reset(&self) {
        self.inner.core.lock().clear();

        tracing::info!(breaker = %self.name(), "Breaker reset");
        self.inner.metric_sink.record_reset();
    }

    fn record_failure(&self, error: Option<E>, timed_out: bool) {
        let outcome = {
            let mut core = self.inner.core.lock();
            self.apply_failure(&mut core, error)
        };
        self.report_failure(outcome, timed_out);
    }

    /// Updates bookkeeping for a failure and schedules the retry, if any.
    fn apply_failure(&self, core: &mut Core<E>, error: Option<E>) -> FailureOutcome {
        core.timer.cancel();
        core.last_failure = Some(LastFailure {
            at: Instant::now(),
            error: error.map(Arc::new),
        });
        core.failure_count = core.failure_count.saturating_add(1);

        let failure_count = core.failure_count;
        let state = core.state(&self.inner.config);
        let retry_delay = if state.permits_call() {
            let delay = self.inner.config.retry_delay(failure_count);
            self.schedule(core, delay, Deferred::Retry);
            Some(delay)
        } else {
            None
        };

        FailureOutcome {
            failure_count,
            state,
            retry_delay,
        }
    }

    fn report_failure(&self, outcome: FailureOutcome, timed_out: bool) {
        let FailureOutcome {
            failure_count,
            state,
            retry_delay,
        } = outcome;

        tracing::debug!(
            breaker = %self.name(),
            failure_count,
            timed_out,
            state = %state,
            "Call failed"
        );
        self.inner
            .metric_sink
            .record_failure(timed_out, failure_count);

        match retry_delay {
            Some(delay) => {
                tracing::debug!(breaker = %self.name(), ?delay, failure_count, "Retry scheduled");
                self.inner.metric_sink.record_retry_scheduled(delay);
            }
            None => self.trip(),
        }
    }

    /// Arms the call timeout and invokes the call hook.
    fn attempt(&self, state: State) {
        {
            let mut core = self.inner.core.lock();
            self.arm_call_timeout(&mut core);
        }
        self.invoke_call(state);
    }

    fn arm_call_timeout(&self, core: &mut Core<E>) {
        self.schedule(core, self.inner.config.call_timeout, Deferred::Timeout);
    }

    fn invoke_call(&self, state: State) {
        tracing::debug!(breaker = %self.name(), state = %state, "Call attempt");
        self.inner.metric_sink.record_call_attempt(state);
        self.inner.hooks.execute_call_hook(self);
    }

    fn trip(&self) {
        let (failure_count, error) = {
            let core = self.inner.core.lock();
            let error = core
                .last_failure
                .as_ref()
                .and_then(|failure| failure.error.clone());
            (core.failure_count, error)
        };

        tracing::warn!(
            breaker = %self.name(),
            failure_count,
            has_error = error.is_some(),
            "Breaker tripped"
        );
        self.inner.metric_sink.record_trip(failure_count);
        self.inner.hooks.execute_trip_hook(self, error.as_deref());
    }

    fn schedule(&self, core: &mut Core<E>, delay: Duration, action: Deferred) {
        let weak = Arc::downgrade(&self.inner);
        core.timer
            .schedule(delay, move |ticket| Self::fire(weak, ticket, action));
    }

    fn fire(weak: Weak<BreakerInner<E>>, ticket: Ticket, action: Deferred) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let breaker = Breaker { inner };

        // The fired action's bookkeeping happens under the same lock as the
        // claim, so a report that cancels the timer cannot slip in between.
        let fired = {
            let mut core = breaker.inner.core.lock();
            if !core.timer.claim(ticket) {
                return;
            }
            match action {
                Deferred::Timeout => Fired::TimedOut(breaker.apply_failure(&mut core, None)),
                Deferred::Retry => {
                    let state = core.state(&breaker.inner.config);
                    breaker.arm_call_timeout(&mut core);
                    Fired::Retry(state)
                }
            }
        };

        tracing::trace!(breaker = %breaker.name(), ?action, "Timer fired");
        match fired {
            Fired::TimedOut(outcome) => breaker.report_failure(outcome, true),
            Fired::Retry(state) => breaker.invoke_call(state),
        }
    }

    #[cfg(test)]
    fn pending_ticket(&self) -> Ticket {
        self.inner.core.lock().timer.current_ticket()
    }
}

// Cheap because inner state is Arc'd
impl<E> Clone for Breaker<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for Breaker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("Breaker")
            .field("name", &self.inner.config.name)
            .field("state", &core.state(&self.inner.config))
            .field("failure_count", &core.failure_count)
            .field("timer_pending", &core.timer.is_pending())
            .finish()
    }
}
