use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::provider_policy::ProviderPolicy;
use crate::ProviderId;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Thread-safe pacing gate enforcing minimum spacing per provider.
///
/// Spacing is keyed by provider, never by call: concurrent callers share
/// one limiter per upstream, and distinct upstreams never serialize each
/// other.
#[derive(Clone)]
pub struct ProviderGate {
    slots: HashMap<ProviderId, ProviderSlot>,
    clock: DefaultClock,
}

#[derive(Clone)]
struct ProviderSlot {
    /// Absent when the policy asks for no pacing at all.
    limiter: Option<Arc<DirectRateLimiter>>,
    max_jitter: Duration,
}

impl ProviderSlot {
    fn from_policy(policy: &ProviderPolicy) -> Self {
        let limiter = Quota::with_period(policy.min_interval)
            .map(|quota| Arc::new(RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN))));

        Self {
            limiter,
            max_jitter: policy.max_gate_jitter,
        }
    }
}

impl ProviderGate {
    pub fn new(policies: &[ProviderPolicy]) -> Self {
        let slots = policies
            .iter()
            .map(|policy| (policy.provider, ProviderSlot::from_policy(policy)))
            .collect();

        Self {
            slots,
            clock: DefaultClock::default(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&ProviderPolicy::defaults())
    }

    /// Try to take the next request slot for `provider`. Denial returns how
    /// long the caller should wait before asking again, jitter included.
    pub fn acquire(&self, provider: ProviderId) -> Result<(), Duration> {
        let Some(slot) = self.slots.get(&provider) else {
            return Ok(());
        };
        let Some(limiter) = &slot.limiter else {
            return Ok(());
        };

        match limiter.check() {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                Err(wait + sample_jitter(slot.max_jitter))
            }
        }
    }
}

fn sample_jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_millis(fastrand::u64(0..=max.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;

    fn strict_policy(provider: ProviderId) -> ProviderPolicy {
        ProviderPolicy {
            provider,
            min_interval: Duration::from_secs(60),
            max_gate_jitter: Duration::ZERO,
            retry: RetryPolicy::instant(1),
        }
    }

    #[test]
    fn second_call_to_the_same_provider_is_paced() {
        let gate = ProviderGate::new(&[strict_policy(ProviderId::Tencent)]);

        assert!(gate.acquire(ProviderId::Tencent).is_ok());

        let wait = gate
            .acquire(ProviderId::Tencent)
            .expect_err("second slot must be denied");
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(60));
    }

    #[test]
    fn providers_do_not_serialize_each_other() {
        let gate = ProviderGate::new(&[
            strict_policy(ProviderId::Tencent),
            strict_policy(ProviderId::EastMoney),
        ]);

        assert!(gate.acquire(ProviderId::Tencent).is_ok());
        assert!(gate.acquire(ProviderId::EastMoney).is_ok());
    }

    #[test]
    fn zero_interval_disables_pacing() {
        let gate = ProviderGate::new(&[ProviderPolicy::unthrottled(ProviderId::Sse)]);

        for _ in 0..8 {
            assert!(gate.acquire(ProviderId::Sse).is_ok());
        }
    }
}
