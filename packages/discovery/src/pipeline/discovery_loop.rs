//! Per-item discovery state machine.
//!
//! ```text
//! SEEDING -> SEARCHING -> PARSING -> VALIDATING -> ACCEPTED
//!                ^                        |
//!                |                        v
//!                +------ REFINING <-- rejected --> EXHAUSTED (round N)
//! ```
//!
//! Rounds are strictly sequential: each prompt depends on the previous
//! round's feedback. Every failure (search, parse, judge) is recorded in the
//! history and fed into the next refinement; nothing aborts the item.

use std::sync::Arc;

use crate::error::FailureKind;
use crate::pipeline::builder::PromptBuilder;
use crate::pipeline::judge::Judge;
use crate::pipeline::parse::parse_candidate;
use crate::pipeline::{ask, bounded};
use crate::traits::probe::{LinkChecker, SourceProbe};
use crate::traits::reasoner::{Reasoner, Role};
use crate::types::candidate::Candidate;
use crate::types::config::DiscoveryConfig;
use crate::types::feedback::Feedback;
use crate::types::item::{Item, SeedContext};
use crate::types::outcome::Outcome;
use crate::types::round::{PromptState, RoundStatus};

/// Prefix added to the explanation when a round repeats a rejected candidate.
pub const REPEATED_CANDIDATE_MARKER: &str = "[repeated candidate]";

/// Drives one item to a terminal outcome within `max_rounds` rounds.
///
/// Cheap to clone; the orchestrator hands one clone to each worker.
#[derive(Clone)]
pub struct DiscoveryLoop {
    reasoner: Arc<dyn Reasoner>,
    probe: Option<Arc<dyn SourceProbe>>,
    builder: PromptBuilder,
    judge: Judge,
    config: DiscoveryConfig,
}

impl DiscoveryLoop {
    pub fn new(reasoner: Arc<dyn Reasoner>, config: DiscoveryConfig) -> Self {
        Self {
            builder: PromptBuilder::new(reasoner.clone(), config.call_timeout),
            judge: Judge::new(reasoner.clone(), config.call_timeout),
            reasoner,
            probe: None,
            config,
        }
    }

    /// Seed each item from this probe before the first round.
    pub fn with_probe(mut self, probe: Arc<dyn SourceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Check candidate reachability before judging.
    pub fn with_link_checker(mut self, checker: Arc<dyn LinkChecker>) -> Self {
        self.judge = self.judge.with_link_checker(checker);
        self
    }

    /// Pin the year the judge's recency check is relative to.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.judge = self.judge.with_current_year(year);
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run the loop for one item.
    pub async fn run(&self, item: &Item) -> Outcome {
        let max_rounds = self.config.max_rounds.max(1);

        tracing::debug!(item_id = %item.id, state = "seeding", "Starting discovery");
        let seed = self.seed(item).await;
        let mut state = PromptState::new(self.builder.initial(item, &seed));

        loop {
            let round = state.round_index();
            let (candidate, feedback, status) = self
                .attempt(item, &seed, state.current_prompt(), round)
                .await;

            let feedback = if state.seen_rejected(&candidate) {
                tracing::warn!(
                    item_id = %item.id,
                    round,
                    url = candidate.url_or_empty(),
                    "Repeated a rejected candidate"
                );
                feedback.prefixed(REPEATED_CANDIDATE_MARKER)
            } else {
                feedback
            };

            state.record(candidate, feedback, status);
            let Some(recorded) = state.last() else {
                break;
            };
            if recorded.feedback.accepted() {
                tracing::info!(
                    item_id = %item.id,
                    round,
                    state = "accepted",
                    url = recorded.candidate.url_or_empty(),
                    year = ?recorded.candidate.reference_year,
                    "Source validated"
                );
                break;
            }

            if round + 1 >= max_rounds {
                tracing::info!(
                    item_id = %item.id,
                    rounds = round + 1,
                    state = "exhausted",
                    explanation = %recorded.feedback.explanation,
                    "No validated source within the round budget"
                );
                break;
            }

            tracing::debug!(item_id = %item.id, round, state = "refining", "Refining prompt");
            let next = self
                .builder
                .refine(
                    item,
                    round,
                    state.current_prompt(),
                    &recorded.candidate,
                    &recorded.feedback,
                )
                .await;
            state.advance(next);
        }

        Outcome::from_history(item.clone(), state.into_history())
    }

    /// SEEDING: probe once; any failure leaves an empty seed.
    async fn seed(&self, item: &Item) -> SeedContext {
        let Some(probe) = &self.probe else {
            return SeedContext::empty();
        };

        match bounded(self.config.call_timeout, probe.probe(&item.name, item.source_type())).await {
            Ok(hits) => {
                tracing::debug!(item_id = %item.id, hits = hits.len(), "Seed context gathered");
                SeedContext::from_hits(hits)
            }
            Err(e) => {
                tracing::warn!(
                    item_id = %item.id,
                    error = %e,
                    "Probe failed, continuing without seed"
                );
                SeedContext::empty()
            }
        }
    }

    /// SEARCHING, PARSING and VALIDATING for one round.
    async fn attempt(
        &self,
        item: &Item,
        seed: &SeedContext,
        prompt: &str,
        round: usize,
    ) -> (Candidate, Feedback, RoundStatus) {
        tracing::debug!(item_id = %item.id, round, state = "searching", "Searching");
        let timeout = self.config.call_timeout;
        let raw = match ask(self.reasoner.as_ref(), prompt, Role::Search, timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(item_id = %item.id, round, error = %e, "Search call failed");
                return (Candidate::empty(), Feedback::search_failure(e), RoundStatus::SearchFailed);
            }
        };

        tracing::debug!(item_id = %item.id, round, state = "parsing", "Parsing response");
        let (candidate, parse_failed) = match parse_candidate(&raw) {
            Ok(candidate) => (candidate, false),
            Err(e) => {
                tracing::warn!(
                    item_id = %item.id,
                    round,
                    error = %e,
                    "Unparseable search response"
                );
                (Candidate::empty(), true)
            }
        };

        tracing::debug!(
            item_id = %item.id,
            round,
            state = "validating",
            url = candidate.url_or_empty(),
            "Judging candidate"
        );
        let feedback = self.judge.judge(item, seed, &candidate).await;

        let status = if feedback.accepted() {
            RoundStatus::Accepted
        } else if parse_failed || feedback.failure == Some(FailureKind::Parse) {
            RoundStatus::ParseFailed
        } else if feedback.failure == Some(FailureKind::Validation) {
            RoundStatus::ValidationFailed
        } else {
            RoundStatus::Rejected
        };

        (candidate, feedback, status)
    }
}
