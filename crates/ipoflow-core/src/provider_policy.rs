use std::time::Duration;

use crate::ProviderId;

/// Client-side limits applied to one upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub request_timeout: Duration,
}

impl ProviderPolicy {
    /// Yahoo's unofficial endpoints start answering 429 well before documented limits.
    pub fn yahoo_default() -> Self {
        Self {
            provider_id: ProviderId::Yahoo,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}
