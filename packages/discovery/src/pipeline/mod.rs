//! Discovery pipeline - the core of the library.
//!
//! The pipeline drives each item through bounded rounds of:
//! - Search (reasoner proposes a source)
//! - Parse (lenient extraction of URL and year)
//! - Judge (rubric verdict, fail-closed)
//! - Refine (reasoner-assisted prompt revision with a templated fallback)
//!
//! and runs many such loops concurrently under the orchestrator.

pub mod builder;
pub mod discovery_loop;
pub mod hints;
pub mod judge;
pub mod orchestrator;
pub mod parse;
pub mod prompts;

use std::future::Future;
use std::time::Duration;

use crate::error::{DiscoveryError, Result};
use crate::traits::reasoner::{Reasoner, Role};

pub use builder::PromptBuilder;
pub use discovery_loop::{DiscoveryLoop, REPEATED_CANDIDATE_MARKER};
pub use hints::company_hint;
pub use judge::Judge;
pub use orchestrator::Orchestrator;
pub use parse::{parse_candidate, parse_verdict, parse_year, year_in_text};
pub use prompts::{
    format_judge_prompt, format_refine_prompt, format_search_prompt, prompt_hash, JUDGE_PROMPT,
    REFINE_PROMPT, SEARCH_PROMPT,
};

/// Run an external call under a time budget.
///
/// An elapsed budget becomes `DiscoveryError::Timeout`, so callers treat it
/// like any other failed call.
pub(crate) async fn bounded<T>(
    budget: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(DiscoveryError::Timeout(budget)),
    }
}

/// Invoke the reasoner under a time budget. Empty text is a failed call.
pub(crate) async fn ask(
    reasoner: &dyn Reasoner,
    prompt: &str,
    role: Role,
    budget: Duration,
) -> Result<String> {
    let text = bounded(budget, reasoner.invoke(prompt, role)).await?;
    if text.trim().is_empty() {
        return Err(DiscoveryError::transport(format!(
            "{} call returned empty text",
            role
        )));
    }
    Ok(text)
}
