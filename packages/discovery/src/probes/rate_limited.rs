//! Rate-limited probe wrapper.
//!
//! Wraps any SourceProbe with rate limiting using the governor crate, so
//! concurrent loops stay polite towards company websites.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::{DiscoveryError, Result};
use crate::traits::probe::{LinkChecker, LinkStatus, ProbeHit, SourceProbe};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A probe wrapper that enforces a shared request quota.
pub struct RateLimitedProbe<P> {
    inner: P,
    limiter: Arc<DefaultRateLimiter>,
}

impl<P> RateLimitedProbe<P> {
    /// Create a new rate-limited probe.
    ///
    /// # Arguments
    /// * `probe` - The underlying probe to wrap
    /// * `requests_per_second` - Maximum probes per second (must be > 0)
    pub fn new(probe: P, requests_per_second: u32) -> Result<Self> {
        let rate = NonZeroU32::new(requests_per_second)
            .ok_or_else(|| DiscoveryError::Config("requests_per_second must be > 0".into()))?;
        Ok(Self::with_quota(probe, Quota::per_second(rate)))
    }

    /// Create with a custom quota.
    pub fn with_quota(probe: P, quota: Quota) -> Self {
        Self {
            inner: probe,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: SourceProbe> SourceProbe for RateLimitedProbe<P> {
    async fn probe(&self, item_name: &str, source_type: &str) -> Result<Vec<ProbeHit>> {
        self.limiter.until_ready().await;
        self.inner.probe(item_name, source_type).await
    }
}

#[async_trait]
impl<P: LinkChecker> LinkChecker for RateLimitedProbe<P> {
    async fn check(&self, url: &str) -> LinkStatus {
        self.limiter.until_ready().await;
        self.inner.check(url).await
    }
}

/// Extension trait for easy rate limiting.
pub trait ProbeExt: SourceProbe + Sized {
    /// Wrap this probe with rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> Result<RateLimitedProbe<Self>> {
        RateLimitedProbe::new(self, requests_per_second)
    }
}

impl<P: SourceProbe + Sized> ProbeExt for P {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProbe;
    use std::time::Instant;

    #[tokio::test]
    async fn test_rate_limiting() {
        let probe = MockProbe::new().rate_limited(2).unwrap();

        let start = Instant::now();
        for name in ["Acme Corp", "Globex", "Initech"] {
            probe.probe(name, "Annual Report").await.unwrap();
        }
        let elapsed = start.elapsed();

        assert_eq!(probe.inner().calls().len(), 3);
        // First is immediate; the third waits for a replenished cell
        assert!(elapsed.as_millis() >= 400, "Rate limiting not working: {:?}", elapsed);
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(MockProbe::new().rate_limited(0).is_err());
    }
}
