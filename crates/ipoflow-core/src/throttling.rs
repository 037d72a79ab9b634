use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::provider::SourceError;
use crate::provider_policy::ProviderPolicy;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side request budget shared by all calls to one provider.
///
/// An exhausted budget is reported as throttling, so the resolver backs off
/// exactly as it would for an upstream 429.
#[derive(Clone)]
pub struct RequestBudget {
    limiter: Arc<DirectRateLimiter>,
}

impl RequestBudget {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                quota_limit,
            ))),
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(policy.quota_window, policy.quota_limit)
    }

    pub fn acquire(&self) -> Result<(), SourceError> {
        self.limiter.check().map_err(|_| {
            SourceError::rate_limited("client-side request budget exhausted, slow down")
        })
    }
}

impl std::fmt::Debug for RequestBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBudget").finish_non_exhaustive()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = quota_limit.max(1);
    let burst = NonZeroU32::new(safe_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
