//! Re-exports common types for convenient usage.
//!
//! # Example
//! ```rust,no_run
//! use backoff_breaker::prelude::*;
//! ```

pub use crate::{Backoff, Breaker, BreakerBuilder, BreakerConfig, BreakerError, State};
