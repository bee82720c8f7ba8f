use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::ProviderId;

/// Courtesy and resilience settings for one upstream provider.
///
/// The thresholds are configuration constants tuned empirically, not
/// contracts published by the providers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider: ProviderId,
    /// Minimum spacing between successive requests to this provider.
    pub min_interval: Duration,
    /// Upper bound of the extra random wait added when the pacing gate
    /// denies a slot, so paced callers do not reconverge in lockstep.
    pub max_gate_jitter: Duration,
    pub retry: RetryPolicy,
}

impl ProviderPolicy {
    pub fn default_for(provider: ProviderId) -> Self {
        Self {
            provider,
            min_interval: Duration::from_secs(1),
            max_gate_jitter: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }

    /// One policy per known provider.
    pub fn defaults() -> Vec<Self> {
        ProviderId::ALL
            .iter()
            .map(|provider| Self::default_for(*provider))
            .collect()
    }

    /// No pacing and no retry delays; for tests and offline drivers.
    pub fn unthrottled(provider: ProviderId) -> Self {
        Self {
            provider,
            min_interval: Duration::ZERO,
            max_gate_jitter: Duration::ZERO,
            retry: RetryPolicy::instant(4),
        }
    }
}
