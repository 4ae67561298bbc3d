//! Rubric judgment of candidates.
//!
//! The judge is fail-closed: a failed call, a timeout, or an unreadable
//! verdict all produce a rejection. Acceptance is derived from the five
//! checks and can be revoked (link check, pinned year) but never granted
//! by anything other than the checks.

use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;

use crate::pipeline::parse::parse_verdict;
use crate::pipeline::prompts::format_judge_prompt;
use crate::pipeline::{ask, bounded};
use crate::traits::probe::{LinkChecker, LinkStatus};
use crate::traits::reasoner::{Reasoner, Role};
use crate::types::candidate::Candidate;
use crate::types::feedback::Feedback;
use crate::types::item::{Item, SeedContext};

/// Evaluates a candidate against the item and its seed context.
#[derive(Clone)]
pub struct Judge {
    reasoner: Arc<dyn Reasoner>,
    link_checker: Option<Arc<dyn LinkChecker>>,
    call_timeout: Duration,
    current_year: i32,
}

impl Judge {
    pub fn new(reasoner: Arc<dyn Reasoner>, call_timeout: Duration) -> Self {
        Self {
            reasoner,
            link_checker: None,
            call_timeout,
            current_year: chrono::Utc::now().year(),
        }
    }

    /// Check reachability before asking the reasoner.
    pub fn with_link_checker(mut self, checker: Arc<dyn LinkChecker>) -> Self {
        self.link_checker = Some(checker);
        self
    }

    /// Year the recency check is relative to (defaults to the current year).
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Judge one candidate. Never fails; failures are rejections.
    pub async fn judge(&self, item: &Item, seed: &SeedContext, candidate: &Candidate) -> Feedback {
        let Some(url) = candidate.source_url.as_deref() else {
            return Feedback::parse_failure("candidate has no URL");
        };

        if let Some(checker) = &self.link_checker {
            let status = bounded(self.call_timeout, async { Ok(checker.check(url).await) })
                .await
                .unwrap_or_else(|e| LinkStatus::Unreachable {
                    reason: e.to_string(),
                });
            if let LinkStatus::Unreachable { reason } = status {
                tracing::info!(
                    item_id = %item.id,
                    url,
                    reason = %reason,
                    "Candidate URL is not reachable"
                );
                return Feedback::rejected("the proposed URL could not be opened")
                    .mark_inaccessible(reason);
            }
        }

        let prompt = format_judge_prompt(item, seed, candidate, self.current_year);
        let verdict = ask(self.reasoner.as_ref(), &prompt, Role::Judge, self.call_timeout)
            .await
            .and_then(|raw| parse_verdict(&raw));

        let feedback = match verdict {
            Ok(feedback) => feedback,
            Err(e) => {
                tracing::warn!(item_id = %item.id, url, error = %e, "Judge produced no verdict");
                return Feedback::validation_failure(e);
            }
        };

        match (item.pinned_year, candidate.reference_year) {
            (Some(pinned), year) if year != Some(pinned) => feedback.revoke(
                |checks| {
                    checks.year_correct = false;
                    checks.year_recent = false;
                },
                format!("reference year must be {}", pinned),
            ),
            _ => feedback,
        }
    }
}
