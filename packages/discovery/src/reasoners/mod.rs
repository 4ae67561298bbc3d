//! Reasoner implementations.
//!
//! `OpenAiReasoner` talks to a chat-completions API (feature `openai`);
//! `RetryingReasoner` adds bounded retry to any reasoner.

#[cfg(feature = "openai")]
mod openai;
mod retry;

#[cfg(feature = "openai")]
pub use openai::OpenAiReasoner;
pub use retry::{ReasonerExt, RetryingReasoner};
