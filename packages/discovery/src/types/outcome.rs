//! Terminal results of the discovery loop and the table that collects them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::candidate::Candidate;
use super::feedback::Feedback;
use super::item::Item;
use super::round::Round;

/// How a result was obtained.
///
/// Only prompt refinement exists today. Scraping-script generation and
/// naive search fallbacks would become further variants once their
/// trigger conditions are decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Strategy {
    #[default]
    PromptRefinement,
}

/// Terminal, immutable result of one item's loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub item: Item,

    /// Last-produced candidate (accepted or not)
    pub final_candidate: Candidate,

    /// True only when the judge accepted `final_candidate`
    pub validated: bool,

    pub rounds_used: usize,

    /// Every round, in order
    pub history: Vec<Round>,

    #[serde(default)]
    pub strategy: Strategy,

    /// Set when the worker crashed before producing rounds
    #[serde(default)]
    pub failure: Option<String>,
}

impl Outcome {
    /// Build an outcome from a finished round history.
    pub fn from_history(item: Item, history: Vec<Round>) -> Self {
        let (final_candidate, validated) = history
            .last()
            .map(|round| (round.candidate.clone(), round.feedback.accepted()))
            .unwrap_or_default();

        Self {
            item,
            final_candidate,
            validated,
            rounds_used: history.len(),
            history,
            strategy: Strategy::PromptRefinement,
            failure: None,
        }
    }

    /// Outcome for an item whose worker crashed.
    pub fn failed(item: Item, reason: impl Into<String>) -> Self {
        Self {
            item,
            final_candidate: Candidate::empty(),
            validated: false,
            rounds_used: 0,
            history: Vec::new(),
            strategy: Strategy::PromptRefinement,
            failure: Some(reason.into()),
        }
    }

    /// Feedback of every round, in order.
    pub fn feedback_history(&self) -> impl Iterator<Item = &Feedback> {
        self.history.iter().map(|round| &round.feedback)
    }

    /// Feedback of the last round.
    pub fn final_feedback(&self) -> Option<&Feedback> {
        self.history.last().map(|round| &round.feedback)
    }

    /// One-line explanation for the output table.
    pub fn feedback_summary(&self) -> String {
        if let Some(reason) = &self.failure {
            return format!("worker failure: {}", reason);
        }
        self.final_feedback()
            .map(Feedback::summary)
            .unwrap_or_default()
    }

    /// Loop stopped without acceptance after using every round.
    pub fn is_exhausted(&self) -> bool {
        !self.validated && self.failure.is_none()
    }
}

/// Counts over a finished table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub total: usize,
    pub validated: usize,
    pub exhausted: usize,
    pub failed: usize,
}

impl TableSummary {
    /// Share of items validated (0.0 for an empty table).
    pub fn validation_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.validated as f64 / self.total as f64
        }
    }
}

/// One outcome per input item, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub run_id: Uuid,
    outcomes: Vec<Outcome>,
}

impl ResultTable {
    /// Wrap outcomes that are already in input order.
    pub fn new(run_id: Uuid, outcomes: Vec<Outcome>) -> Self {
        Self { run_id, outcomes }
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }

    pub fn summary(&self) -> TableSummary {
        self.outcomes
            .iter()
            .fold(TableSummary::default(), |mut acc, outcome| {
                acc.total += 1;
                if outcome.validated {
                    acc.validated += 1;
                } else if outcome.failure.is_some() {
                    acc.failed += 1;
                } else {
                    acc.exhausted += 1;
                }
                acc
            })
    }
}
