//! Prompt construction and revision.

use std::sync::Arc;
use std::time::Duration;

use crate::pipeline::hints::company_hint;
use crate::pipeline::prompts::{append_feedback, format_refine_prompt, format_search_prompt};
use crate::pipeline::ask;
use crate::traits::reasoner::{Reasoner, Role};
use crate::types::candidate::Candidate;
use crate::types::feedback::Feedback;
use crate::types::item::{Item, SeedContext};

/// Revised prompts shorter than this are discarded.
const MIN_REFINED_PROMPT_LEN: usize = 100;

/// Builds the initial search prompt and revises it after each rejection.
#[derive(Clone)]
pub struct PromptBuilder {
    reasoner: Arc<dyn Reasoner>,
    call_timeout: Duration,
}

impl PromptBuilder {
    pub fn new(reasoner: Arc<dyn Reasoner>, call_timeout: Duration) -> Self {
        Self {
            reasoner,
            call_timeout,
        }
    }

    /// Initial prompt for an item. Same item and seed, same prompt.
    pub fn initial(&self, item: &Item, seed: &SeedContext) -> String {
        format_search_prompt(item, seed, company_hint(&item.name))
    }

    /// Revise `previous` using the rejected candidate and its feedback.
    ///
    /// Asks the reasoner for a corrected prompt. If that call fails, or the
    /// answer is too short or drops the company name, falls back to
    /// appending the feedback to `previous`. Never fails.
    pub async fn refine(
        &self,
        item: &Item,
        round: usize,
        previous: &str,
        candidate: &Candidate,
        feedback: &Feedback,
    ) -> String {
        let request = format_refine_prompt(item, previous, candidate, feedback);

        match ask(self.reasoner.as_ref(), &request, Role::Refine, self.call_timeout).await {
            Ok(revised) => {
                let revised = strip_fences(&revised);
                if is_usable(item, revised) {
                    tracing::debug!(
                        item_id = %item.id,
                        round,
                        len = revised.len(),
                        "Using revised prompt"
                    );
                    return revised.to_string();
                }
                tracing::warn!(
                    item_id = %item.id,
                    round,
                    len = revised.len(),
                    "Revised prompt unusable, appending feedback instead"
                );
            }
            Err(e) => {
                tracing::warn!(
                    item_id = %item.id,
                    round,
                    error = %e,
                    "Prompt revision failed, appending feedback instead"
                );
            }
        }

        append_feedback(previous, round, candidate, feedback)
    }
}

fn is_usable(item: &Item, revised: &str) -> bool {
    revised.len() >= MIN_REFINED_PROMPT_LEN
        && revised.to_lowercase().contains(&item.name.to_lowercase())
}

/// Drop a surrounding Markdown fence, if the reasoner added one.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
            body.trim_end().trim_end_matches("```").trim()
        }
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedReasoner;
    use crate::types::feedback::Checks;

    fn builder(reasoner: &Arc<ScriptedReasoner>) -> PromptBuilder {
        PromptBuilder::new(reasoner.clone(), Duration::from_secs(5))
    }

    fn acme() -> Item {
        Item::new("1", "Acme Corp", "turnover")
    }

    #[test]
    fn test_initial_is_deterministic() {
        let reasoner = Arc::new(ScriptedReasoner::new());
        let b = builder(&reasoner);
        let seed = SeedContext::empty();
        assert_eq!(b.initial(&acme(), &seed), b.initial(&acme(), &seed));
        assert!(reasoner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refine_uses_reasoner_answer() {
        let revised = format!(
            "Find the 2024 annual report of Acme Corp on its investor relations site. {}",
            "Return a direct PDF link and the fiscal year as JSON.".repeat(2)
        );
        let reasoner = Arc::new(ScriptedReasoner::new().with_refine(vec![Ok(revised.clone())]));

        let prompt = builder(&reasoner)
            .refine(&acme(), 0, "old prompt", &Candidate::empty(), &Feedback::rejected("homepage"))
            .await;

        assert_eq!(prompt, revised);
        let calls = reasoner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("Explanation: homepage"));
    }

    #[tokio::test]
    async fn test_refine_falls_back_when_revision_drops_company() {
        let reasoner = Arc::new(ScriptedReasoner::new().with_refine(vec![Ok("x".repeat(150))]));
        let feedback = Feedback::from_checks(Checks::default(), "URL is a generic homepage");

        let prompt = builder(&reasoner)
            .refine(&acme(), 0, "old prompt", &Candidate::empty(), &feedback)
            .await;

        assert!(prompt.starts_with("old prompt"));
        assert!(prompt.contains("URL is a generic homepage"));
    }

    #[tokio::test]
    async fn test_refine_fallback_embeds_each_explanation() {
        let reasoner = Arc::new(ScriptedReasoner::new().with_refine_failure("service unavailable"));
        let b = builder(&reasoner);
        let candidate = Candidate::new("https://acme.com", 2023);

        let first = b
            .refine(&acme(), 0, "p", &candidate, &Feedback::rejected("points to the homepage"))
            .await;
        let second = b
            .refine(&acme(), 0, "p", &candidate, &Feedback::rejected("report is from 2019"))
            .await;

        assert!(first.contains("points to the homepage"));
        assert!(second.contains("report is from 2019"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```text\nhello\n```"), "hello");
        assert_eq!(strip_fences("  plain  "), "plain");
    }
}
