//! Per-item prompt state and its append-only round history.

use serde::{Deserialize, Serialize};

use super::candidate::Candidate;
use super::feedback::Feedback;
use crate::pipeline::prompts::prompt_hash;

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Accepted,
    Rejected,
    SearchFailed,
    ParseFailed,
    ValidationFailed,
}

/// One search-validate cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// Zero-based, contiguous within an item
    pub index: usize,

    /// Prompt sent to the reasoner for this round
    pub prompt: String,

    /// SHA-256 of the prompt, for spotting repeated prompts in the audit trail
    pub prompt_hash: String,

    pub candidate: Candidate,
    pub feedback: Feedback,
    pub status: RoundStatus,
}

/// Evolving prompt plus the full audit trail for one item.
///
/// Owned by exactly one discovery loop. History only grows.
#[derive(Debug, Clone)]
pub struct PromptState {
    current_prompt: String,
    round_index: usize,
    history: Vec<Round>,
}

impl PromptState {
    /// Start at round 0 with the initial prompt.
    pub fn new(initial_prompt: impl Into<String>) -> Self {
        Self {
            current_prompt: initial_prompt.into(),
            round_index: 0,
            history: Vec::new(),
        }
    }

    pub fn current_prompt(&self) -> &str {
        &self.current_prompt
    }

    pub fn round_index(&self) -> usize {
        self.round_index
    }

    pub fn history(&self) -> &[Round] {
        &self.history
    }

    /// Rounds recorded so far.
    pub fn rounds_used(&self) -> usize {
        self.history.len()
    }

    /// Record the result of the current round.
    ///
    /// Each round index is recorded at most once; a second call for the same
    /// round is ignored and logged.
    pub fn record(
        &mut self,
        candidate: Candidate,
        feedback: Feedback,
        status: RoundStatus,
    ) -> Option<&Round> {
        if self.history.len() == self.round_index {
            self.history.push(Round {
                index: self.round_index,
                prompt: self.current_prompt.clone(),
                prompt_hash: prompt_hash(&self.current_prompt),
                candidate,
                feedback,
                status,
            });
        } else {
            tracing::error!(
                round = self.round_index,
                recorded = self.history.len(),
                "Round already recorded; ignoring duplicate"
            );
        }
        self.history.last()
    }

    /// True when an earlier, rejected round produced the same candidate.
    pub fn seen_rejected(&self, candidate: &Candidate) -> bool {
        self.history
            .iter()
            .any(|round| !round.feedback.accepted() && round.candidate.same_as(candidate))
    }

    /// Move to the next round with a revised prompt.
    pub fn advance(&mut self, next_prompt: impl Into<String>) {
        self.current_prompt = next_prompt.into();
        self.round_index += 1;
    }

    /// Last recorded round, if any.
    pub fn last(&self) -> Option<&Round> {
        self.history.last()
    }

    pub fn into_history(self) -> Vec<Round> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_contiguous() {
        let mut state = PromptState::new("prompt 0");
        state.record(
            Candidate::empty(),
            Feedback::search_failure("timeout"),
            RoundStatus::SearchFailed,
        );
        state.advance("prompt 1");
        state.record(
            Candidate::new("https://acme.com/ar.pdf", 2023),
            Feedback::rejected("homepage"),
            RoundStatus::Rejected,
        );

        let indices: Vec<_> = state.history().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(state.rounds_used(), 2);
        assert_eq!(state.history()[1].prompt, "prompt 1");
        assert_eq!(state.history()[1].prompt_hash, prompt_hash("prompt 1"));
    }

    #[test]
    fn test_double_record_is_ignored() {
        let mut state = PromptState::new("p");
        state.record(Candidate::empty(), Feedback::rejected("a"), RoundStatus::Rejected);
        state.record(Candidate::empty(), Feedback::rejected("b"), RoundStatus::Rejected);
        assert_eq!(state.rounds_used(), 1);
        assert_eq!(state.history()[0].feedback.explanation, "a");
    }

    #[test]
    fn test_seen_rejected() {
        let mut state = PromptState::new("p");
        let candidate = Candidate::new("https://acme.com", 2023);
        state.record(candidate.clone(), Feedback::rejected("generic"), RoundStatus::Rejected);
        assert!(state.seen_rejected(&candidate));
        assert!(!state.seen_rejected(&Candidate::new("https://acme.com/ar.pdf", 2023)));
    }
}
