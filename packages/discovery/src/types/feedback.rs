//! Structured judgments of a candidate.

use serde::{Deserialize, Serialize};

use crate::error::FailureKind;

/// Outcome of the five rubric checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checks {
    pub url_accessible: bool,
    pub relevant: bool,
    pub specific: bool,
    pub year_correct: bool,
    pub year_recent: bool,
}

impl Checks {
    /// Every check passes.
    pub fn all_pass() -> Self {
        Self {
            url_accessible: true,
            relevant: true,
            specific: true,
            year_correct: true,
            year_recent: true,
        }
    }

    pub fn passed(&self) -> bool {
        self.url_accessible
            && self.relevant
            && self.specific
            && self.year_correct
            && self.year_recent
    }

    /// Names of the checks that did not pass, in rubric order.
    pub fn failed(&self) -> Vec<&'static str> {
        [
            (self.url_accessible, "url_accessible"),
            (self.relevant, "relevant"),
            (self.specific, "specific"),
            (self.year_correct, "year_correct"),
            (self.year_recent, "year_recent"),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, name)| name)
        .collect()
    }
}

/// Judgment of one candidate.
///
/// `accepted` is derived from the checks and can only be true when every
/// check passes; there is no constructor that sets it independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    accepted: bool,

    #[serde(flatten)]
    pub checks: Checks,

    /// Why the candidate was accepted or rejected
    pub explanation: String,

    /// Concrete advice for the next search, if the judge gave any
    #[serde(default)]
    pub suggestions: Option<String>,

    /// 0-100 score reported by the judge
    #[serde(default)]
    pub score: Option<u8>,

    /// Set when the round failed rather than being judged
    #[serde(default)]
    pub failure: Option<FailureKind>,
}

impl Feedback {
    /// Feedback from a completed judgment.
    pub fn from_checks(checks: Checks, explanation: impl Into<String>) -> Self {
        Self {
            accepted: checks.passed(),
            checks,
            explanation: explanation.into(),
            suggestions: None,
            score: None,
            failure: None,
        }
    }

    /// A rejection with no checks passed.
    pub fn rejected(explanation: impl Into<String>) -> Self {
        Self::from_checks(Checks::default(), explanation)
    }

    /// The search call failed; nothing was judged.
    pub fn search_failure(reason: impl std::fmt::Display) -> Self {
        let mut feedback = Self::rejected(format!("search failure: {}", reason));
        feedback.failure = Some(FailureKind::Transport);
        feedback
    }

    /// The search response could not be parsed into a candidate.
    pub fn parse_failure(reason: impl std::fmt::Display) -> Self {
        let mut feedback = Self::rejected(format!(
            "parse failure: no usable URL or year in the response ({})",
            reason
        ));
        feedback.failure = Some(FailureKind::Parse);
        feedback
    }

    /// The judge could not produce a verdict. Never an acceptance.
    pub fn validation_failure(reason: impl std::fmt::Display) -> Self {
        let mut feedback = Self::rejected(format!("validation failure: {}", reason));
        feedback.failure = Some(FailureKind::Validation);
        feedback
    }

    pub fn with_suggestions(mut self, suggestions: impl Into<String>) -> Self {
        self.suggestions = Some(suggestions.into());
        self
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score.min(100));
        self
    }

    /// Force the accessibility check to fail, appending the reason.
    pub fn mark_inaccessible(self, reason: impl std::fmt::Display) -> Self {
        self.revoke(
            |checks| checks.url_accessible = false,
            format!("link check: {}", reason),
        )
    }

    /// Fail one or more checks after the fact, appending a note.
    ///
    /// Can only take acceptance away, never grant it.
    pub fn revoke(
        mut self,
        update: impl FnOnce(&mut Checks),
        note: impl std::fmt::Display,
    ) -> Self {
        update(&mut self.checks);
        self.accepted = self.accepted && self.checks.passed();
        self.explanation = format!("{} ({})", self.explanation, note);
        self
    }

    /// Prefix the explanation with a marker.
    pub fn prefixed(mut self, marker: &str) -> Self {
        self.explanation = format!("{} {}", marker, self.explanation);
        self
    }

    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// One-line summary for tabular output.
    pub fn summary(&self) -> String {
        let mut summary = if self.accepted {
            format!("accepted: {}", self.explanation)
        } else {
            let failed = self.checks.failed();
            if failed.is_empty() || self.failure.is_some() {
                self.explanation.clone()
            } else {
                format!("rejected [{}]: {}", failed.join(", "), self.explanation)
            }
        };
        summary = summary.split_whitespace().collect::<Vec<_>>().join(" ");
        summary
    }
}
