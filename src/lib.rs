//! # backoff-breaker
//!
//! A timer-driven circuit breaker for asynchronous, callback-style
//! operations, with automatic retries and optional exponential backoff.
//!
//! The breaker tracks consecutive failures of a guarded operation. While the
//! failure count stays within the retry budget, each failure schedules a new
//! attempt after a backoff delay. Once the budget is exceeded the breaker
//! trips: it notifies the caller and stops invoking the operation until the
//! reset timeout has elapsed or the caller resets it.
//!
//! The state is derived from the failure bookkeeping on every read:
//!
//! - **Closed**: failures are within the retry budget. Calls proceed.
//! - **Open**: the budget is exceeded and the reset timeout is still running.
//!   `execute` trips instead of calling.
//! - **Half-Open**: the reset timeout has elapsed since the last failure. The
//!   next `execute` makes a trial call.
//!
//! ## Basic Usage
//!
//! ```rust
//! use backoff_breaker::{Breaker, State};
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct ServiceError(u16);
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let breaker = Breaker::<ServiceError>::builder()
//!     .max_retries(2)
//!     .retry_interval(Duration::from_secs(1))
//!     .exponential_backoff(false)
//!     .reset_timeout(Duration::from_secs(30))
//!     .on_call(|breaker| {
//!         // Start the guarded operation; report its outcome when it completes.
//!         let breaker = breaker.clone();
//!         tokio::spawn(async move {
//!             breaker.success();
//!         });
//!     })
//!     .on_trip(|_breaker, error| {
//!         eprintln!("breaker tripped, last error: {:?}", error);
//!     })
//!     .build()
//!     .expect("running inside a Tokio runtime");
//!
//! breaker.execute();
//! assert_eq!(breaker.state(), State::Closed);
//! # }
//! ```
//!
//! ## Runtime
//!
//! Timeouts and retries are Tokio tasks. A breaker must be built inside a
//! Tokio runtime, or be given one with
//! [`BreakerBuilder::runtime`](crate::BreakerBuilder::runtime).
//!
//! ## Concurrency
//!
//! Operations never block and hooks always run without internal locks held,
//! so hooks may call back into the breaker. Handles may be shared across
//! threads, but callers that issue operations from several contexts at once
//! are responsible for the order in which those operations happen.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod breaker;
mod config;
mod error;
mod hook;
mod metrics;
mod policy;
pub mod prelude;
mod state;
mod timer;

// Re-exports
pub use breaker::Breaker;
pub use config::{BreakerBuilder, BreakerConfig};
pub use error::{BreakerError, BreakerResult};
pub use hook::{CallHook, HookRegistry, TripHook};
pub use metrics::{MetricSink, NullMetricSink};
pub use policy::Backoff;
pub use state::State;
