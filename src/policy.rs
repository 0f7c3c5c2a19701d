//! Retry backoff policy.

use std::time::Duration;

/// How the delay before an automatic retry grows with the failure count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Every retry waits exactly the retry interval.
    Constant,

    /// Retry `n` waits `retry_interval ^ n` seconds, where `n` is the failure
    /// count at scheduling time.
    #[default]
    Exponential,
}

impl Backoff {
    /// Maps a "use exponential backoff" flag onto a policy.
    pub fn from_exponential_flag(exponential: bool) -> Self {
        if exponential {
            Backoff::Exponential
        } else {
            Backoff::Constant
        }
    }

    /// Returns true for [`Backoff::Exponential`].
    pub fn is_exponential(self) -> bool {
        self == Backoff::Exponential
    }

    /// Computes the delay before the retry scheduled at `failure_count`.
    ///
    /// The exponential form raises the interval, read in seconds, to the
    /// failure count. Results too large for a `Duration` saturate to
    /// `Duration::MAX`.
    pub fn delay(self, retry_interval: Duration, failure_count: u32) -> Duration {
        match self {
            Backoff::Constant => retry_interval,
            Backoff::Exponential => {
                let exponent = i32::try_from(failure_count).unwrap_or(i32::MAX);
                let secs = retry_interval.as_secs_f64().powi(exponent);
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_ignores_failure_count() {
        let interval = Duration::from_secs(2);
        for n in [0, 1, 5, 100] {
            assert_eq!(Backoff::Constant.delay(interval, n), interval);
        }
    }

    #[test]
    fn exponential_raises_interval_to_failure_count() {
        let interval = Duration::from_secs(2);
        assert_eq!(Backoff::Exponential.delay(interval, 0), Duration::from_secs(1));
        assert_eq!(Backoff::Exponential.delay(interval, 1), Duration::from_secs(2));
        assert_eq!(Backoff::Exponential.delay(interval, 3), Duration::from_secs(8));
    }

    #[test]
    fn exponential_sub_second_interval_shrinks() {
        let delay = Backoff::Exponential.delay(Duration::from_millis(500), 2);
        assert_eq!(delay, Duration::from_millis(250));
    }

    #[test]
    fn exponential_saturates() {
        let delay = Backoff::Exponential.delay(Duration::from_secs(10), 4000);
        assert_eq!(delay, Duration::MAX);
    }

    #[test]
    fn flag_mapping() {
        assert_eq!(Backoff::from_exponential_flag(true), Backoff::Exponential);
        assert_eq!(Backoff::from_exponential_flag(false), Backoff::Constant);
        assert!(Backoff::default().is_exponential());
    }
}
