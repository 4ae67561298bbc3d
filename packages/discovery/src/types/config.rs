//! Configuration for the discovery loop and orchestrator.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DiscoveryError, Result};

/// Configuration consumed by the orchestrator and every loop it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Maximum search-validate rounds per item (N).
    ///
    /// Bounds the worst-case latency of one item. Default: 3.
    pub max_rounds: usize,

    /// Loops executing at the same time.
    ///
    /// Default: 4.
    pub max_concurrency: usize,

    /// Time budget for each external call (probe, search, judge, refine).
    ///
    /// A call that exceeds it is treated as a failed call. Default: 60s.
    #[serde(with = "duration_ms", rename = "call_timeout_ms")]
    pub call_timeout: Duration,

    /// Retry policy used by the adapters (not by the round loop).
    pub retry: RetryPolicy,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            max_concurrency: 4,
            call_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max rounds per item.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Set the worker pool size.
    pub fn with_max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = workers;
        self
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set the adapter retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reject configurations the loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(DiscoveryError::Config("max_rounds must be at least 1".into()));
        }
        if self.max_concurrency == 0 {
            return Err(DiscoveryError::Config(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.max_concurrency > tokio::sync::Semaphore::MAX_PERMITS {
            return Err(DiscoveryError::Config(format!(
                "max_concurrency must be at most {}",
                tokio::sync::Semaphore::MAX_PERMITS
            )));
        }
        if self.call_timeout.is_zero() {
            return Err(DiscoveryError::Config("call_timeout must be non-zero".into()));
        }
        Ok(())
    }
}

/// Bounded retry with linear backoff for transport calls.
///
/// Separate from the round loop: a retry means "the network hiccuped",
/// a round means "the answer was wrong".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = no retry)
    pub max_attempts: u32,

    /// Delay before retry `n` is `base_delay * n`
    #[serde(with = "duration_ms", rename = "base_delay_ms")]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
