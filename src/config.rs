//! Configuration for circuit breakers.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::breaker::Breaker;
use crate::error::{BreakerError, BreakerResult};
use crate::hook::HookRegistry;
use crate::metrics::{MetricSink, NullMetricSink};
use crate::policy::Backoff;

/// Fixed configuration of a breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Label attached to log events.
    pub name: String,

    /// Time allowed for a single attempt before it counts as a failure.
    pub call_timeout: Duration,

    /// Failures tolerated before the breaker opens.
    pub max_retries: u32,

    /// Base delay between automatic retries.
    pub retry_interval: Duration,

    /// Growth of the retry delay with the failure count.
    pub backoff: Backoff,

    /// Time after the last failure, once open, before a trial call is allowed.
    pub reset_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            name: "breaker".to_string(),
            call_timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_interval: Duration::from_secs(2),
            backoff: Backoff::Exponential,
            reset_timeout: Duration::from_secs(10),
        }
    }
}

impl BreakerConfig {
    /// Delay before the retry scheduled when the failure count reaches `failure_count`.
    pub fn retry_delay(&self, failure_count: u32) -> Duration {
        self.backoff.delay(self.retry_interval, failure_count)
    }

    /// Checks that the configuration can drive a breaker.
    pub fn validate(&self) -> BreakerResult<()> {
        if self.call_timeout.is_zero() {
            return Err(BreakerError::InvalidConfig("call timeout must be non-zero"));
        }
        Ok(())
    }
}

/// Builder for creating circuit breakers with custom configurations.
pub struct BreakerBuilder<E> {
    config: BreakerConfig,
    hooks: HookRegistry<E>,
    metric_sink: Arc<dyn MetricSink>,
    runtime: Option<Handle>,
    _error_type: PhantomData<fn() -> E>,
}

impl<E> Default for BreakerBuilder<E>
where
    E: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> BreakerBuilder<E>
where
    E: Send + Sync + 'static,
{
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: BreakerConfig::default(),
            hooks: HookRegistry::new(),
            metric_sink: Arc::new(NullMetricSink),
            runtime: None,
            _error_type: PhantomData,
        }
    }

    /// Sets the label attached to log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the time allowed for a single attempt.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// Sets the number of failures tolerated before the breaker opens.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Sets the base delay between automatic retries.
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.retry_interval = interval;
        self
    }

    /// Enables or disables exponential retry backoff.
    pub fn exponential_backoff(mut self, enabled: bool) -> Self {
        self.config.backoff = Backoff::from_exponential_flag(enabled);
        self
    }

    /// Sets the retry backoff policy.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// Sets the cooldown after the last failure before a trial call is allowed.
    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.config.reset_timeout = timeout;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: BreakerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the hook that performs the guarded operation.
    pub fn on_call<F>(self, f: F) -> Self
    where
        F: Fn(&Breaker<E>) + Send + Sync + 'static,
    {
        self.hooks.set_on_call(f);
        self
    }

    /// Sets the hook to call when the breaker trips.
    pub fn on_trip<F>(self, f: F) -> Self
    where
        F: Fn(&Breaker<E>, Option<&E>) + Send + Sync + 'static,
    {
        self.hooks.set_on_trip(f);
        self
    }

    /// Sets a hook registry for the breaker.
    pub fn hooks(mut self, hooks: HookRegistry<E>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets a metric sink for the breaker.
    pub fn metric_sink<M: MetricSink>(mut self, sink: M) -> Self {
        self.metric_sink = Arc::new(sink);
        self
    }

    /// Sets the runtime that drives timeout and retry timers.
    ///
    /// Defaults to the runtime the breaker is built on.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Builds a new breaker with the configured settings.
    pub fn build(self) -> BreakerResult<Breaker<E>> {
        self.config.validate()?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| BreakerError::NoRuntime)?,
        };

        Ok(Breaker::new(
            self.config,
            self.hooks,
            self.metric_sink,
            runtime,
        ))
    }
}
