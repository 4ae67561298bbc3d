//! Bounded retry around any reasoner.

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::{FailureKind, Result};
use crate::traits::reasoner::{Reasoner, Role};
use crate::types::config::RetryPolicy;

/// Retries transport failures of the wrapped reasoner with linear backoff.
///
/// The discovery loop's per-call timeout still bounds the whole sequence,
/// retries included.
pub struct RetryingReasoner<R> {
    inner: R,
    policy: RetryPolicy,
}

impl<R: Reasoner> RetryingReasoner<R> {
    pub fn new(inner: R, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: Reasoner> Reasoner for RetryingReasoner<R> {
    async fn invoke(&self, prompt: &str, role: Role) -> Result<String> {
        let mut attempt = 1;

        loop {
            match self.inner.invoke(prompt, role).await {
                Ok(text) => return Ok(text),
                Err(e)
                    if attempt < self.policy.max_attempts
                        && e.kind() == FailureKind::Transport =>
                {
                    tracing::warn!(
                        role = %role,
                        error = %e,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        "Reasoner call failed, retrying..."
                    );
                    sleep(self.policy.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        role = %role,
                        error = %e,
                        attempt,
                        "Reasoner call failed after all retries"
                    );
                    return Err(e);
                }
            }
        }
    }
}

/// Extension trait for wrapping reasoners.
pub trait ReasonerExt: Reasoner + Sized {
    /// Retry transport failures according to `policy`.
    fn with_retry(self, policy: RetryPolicy) -> RetryingReasoner<Self> {
        RetryingReasoner::new(self, policy)
    }
}

impl<R: Reasoner + Sized> ReasonerExt for R {}
