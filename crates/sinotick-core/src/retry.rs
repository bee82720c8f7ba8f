//! Retry policy for transient upstream failures.
//!
//! The decision logic is a pure function from (attempt number, failure
//! kind) to the next state, so the whole schedule can be exercised in
//! tests without sleeping.

use std::time::Duration;

use crate::error::TransportFailure;

/// Delay progression between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Fixed delay between retries.
    Fixed { delay: Duration },
    /// `base * factor^(attempt - 1)`, capped at `max`.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay before the retry that follows `attempt` (1-based).
    pub fn delay_after(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential { base, factor, max } => {
                let exponent = attempt.saturating_sub(1);
                let scaled = base.as_secs_f64() * factor.powi(exponent as i32);
                Duration::from_secs_f64(scaled.min(max.as_secs_f64()))
            }
        }
    }
}

/// Additive random delay smeared over every retry wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterRange {
    pub min: Duration,
    pub max: Duration,
}

impl JitterRange {
    pub fn sample(self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let span = (self.max - self.min).as_millis() as u64;
        self.min + Duration::from_millis(fastrand::u64(0..=span))
    }
}

/// Observable states of one transport exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    Attempting { attempt: u32 },
    RetryScheduled { attempt: u32, delay: Duration },
    Succeeded { attempts: u32 },
    Failed { attempts: u32 },
}

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub jitter: Option<JitterRange>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff: Backoff::Exponential {
                base: Duration::from_secs(5),
                factor: 2.0,
                max: Duration::from_secs(60),
            },
            jitter: Some(JitterRange {
                min: Duration::from_secs(1),
                max: Duration::from_secs(3),
            }),
        }
    }
}

impl RetryPolicy {
    /// Zero-delay variant for tests and offline drivers.
    pub fn instant(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed {
                delay: Duration::ZERO,
            },
            jitter: None,
        }
    }

    pub const fn begin(&self) -> RetryState {
        RetryState::Attempting { attempt: 1 }
    }

    pub const fn on_success(&self, attempt: u32) -> RetryState {
        RetryState::Succeeded { attempts: attempt }
    }

    pub fn on_failure(&self, attempt: u32, failure: &TransportFailure) -> RetryState {
        if !is_transient(failure) || attempt >= self.max_attempts {
            return RetryState::Failed { attempts: attempt };
        }

        RetryState::RetryScheduled {
            attempt,
            delay: self.delay_after(attempt),
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        let base = self.backoff.delay_after(attempt);
        match self.jitter {
            Some(range) => base + range.sample(),
            None => base,
        }
    }
}

/// Failures worth retrying: everything that smells like congestion or a
/// rate-limit ban. These upstreams signal bans as 403 rather than 429.
pub fn is_transient(failure: &TransportFailure) -> bool {
    match failure {
        TransportFailure::Timeout | TransportFailure::Connect | TransportFailure::Reset => true,
        TransportFailure::Status(status) => {
            matches!(status, 403 | 408 | 429) || (500..=599).contains(status)
        }
        TransportFailure::Other(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(5),
            factor: 2.0,
            max: Duration::from_secs(60),
        };

        assert_eq!(backoff.delay_after(1), Duration::from_secs(5));
        assert_eq!(backoff.delay_after(2), Duration::from_secs(10));
        assert_eq!(backoff.delay_after(3), Duration::from_secs(20));
        assert_eq!(backoff.delay_after(4), Duration::from_secs(40));
        assert_eq!(backoff.delay_after(5), Duration::from_secs(60));
        assert_eq!(backoff.delay_after(9), Duration::from_secs(60));
    }

    #[test]
    fn jitter_stays_within_its_range() {
        let policy = RetryPolicy::default();

        for attempt in 1..=3 {
            let state = policy.on_failure(attempt, &TransportFailure::Timeout);
            let RetryState::RetryScheduled { delay, .. } = state else {
                panic!("expected a scheduled retry, got {state:?}");
            };
            let floor = policy.backoff.delay_after(attempt) + Duration::from_secs(1);
            let ceiling = policy.backoff.delay_after(attempt) + Duration::from_secs(3);
            assert!(delay >= floor, "attempt {attempt}: {delay:?} < {floor:?}");
            assert!(delay <= ceiling, "attempt {attempt}: {delay:?} > {ceiling:?}");
        }
    }

    #[test]
    fn transient_failures_schedule_a_retry() {
        let policy = RetryPolicy::instant(4);

        let state = policy.on_failure(1, &TransportFailure::Timeout);
        assert_eq!(
            state,
            RetryState::RetryScheduled {
                attempt: 1,
                delay: Duration::ZERO
            }
        );
    }

    #[test]
    fn non_transient_failures_fail_on_the_spot() {
        let policy = RetryPolicy::instant(4);

        let state = policy.on_failure(1, &TransportFailure::Status(404));
        assert_eq!(state, RetryState::Failed { attempts: 1 });

        let state = policy.on_failure(1, &TransportFailure::Other(String::from("bad url")));
        assert_eq!(state, RetryState::Failed { attempts: 1 });
    }

    #[test]
    fn exhaustion_reports_the_final_attempt_count() {
        let policy = RetryPolicy::instant(4);

        assert!(matches!(
            policy.on_failure(3, &TransportFailure::Status(503)),
            RetryState::RetryScheduled { .. }
        ));
        assert_eq!(
            policy.on_failure(4, &TransportFailure::Status(503)),
            RetryState::Failed { attempts: 4 }
        );
    }

    #[test]
    fn rate_limit_bans_count_as_transient() {
        assert!(is_transient(&TransportFailure::Status(403)));
        assert!(is_transient(&TransportFailure::Status(429)));
        assert!(is_transient(&TransportFailure::Status(502)));
        assert!(is_transient(&TransportFailure::Reset));
        assert!(!is_transient(&TransportFailure::Status(400)));
        assert!(!is_transient(&TransportFailure::Status(404)));
    }
}
