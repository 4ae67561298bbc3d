//! Reasoner trait for natural-language reasoning calls.
//!
//! The discovery loop talks to the reasoning service in three roles:
//! - Search: propose a source URL and reference year
//! - Judge: evaluate a proposed candidate against the rubric
//! - Refine: rewrite a search prompt using the judge's feedback
//!
//! The service is stateless from the loop's point of view. Anything that is
//! not a non-empty text answer (error status, timeout, empty body) is a call
//! failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Role of a reasoner call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Search,
    Judge,
    Refine,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Judge => "judge",
            Self::Refine => "refine",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless prompt-in, text-out reasoning service.
///
/// Implementations wrap specific LLM providers. Retries for transport
/// trouble belong inside the implementation (see `RetryingReasoner`), never
/// in the round loop.
///
/// # Example
///
/// ```rust,ignore
/// let reasoner = OpenAiReasoner::from_env()?.with_retry(RetryPolicy::default());
/// let raw = reasoner.invoke("Find the annual report of Acme Corp", Role::Search).await?;
/// ```
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Send a prompt and return the raw response text.
    async fn invoke(&self, prompt: &str, role: Role) -> Result<String>;
}

#[async_trait]
impl<R: Reasoner + ?Sized> Reasoner for std::sync::Arc<R> {
    async fn invoke(&self, prompt: &str, role: Role) -> Result<String> {
        (**self).invoke(prompt, role).await
    }
}
