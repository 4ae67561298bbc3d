//! Candidate results proposed by a search call.

use serde::{Deserialize, Serialize};

/// A proposed (source URL, reference year) pair.
///
/// Either half may be missing; a candidate with neither is what a failed
/// search or an unparseable response leaves behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Direct URL to the document or filing
    pub source_url: Option<String>,

    /// Fiscal/reporting year of the data (not the publication year)
    pub reference_year: Option<i32>,

    /// Confidence declared by the search response
    #[serde(default)]
    pub confidence: Option<Confidence>,

    /// Free-text rationale from the search response
    #[serde(default)]
    pub notes: Option<String>,
}

impl Candidate {
    /// An entirely absent candidate.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a candidate with a URL and year.
    pub fn new(url: impl Into<String>, year: i32) -> Self {
        Self {
            source_url: Some(url.into()),
            reference_year: Some(year),
            confidence: None,
            notes: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// True when neither a URL nor a year is present.
    pub fn is_empty(&self) -> bool {
        self.source_url.is_none() && self.reference_year.is_none()
    }

    /// Same URL and year as `other`; confidence and notes are ignored.
    pub fn same_as(&self, other: &Candidate) -> bool {
        !self.is_empty()
            && self.source_url == other.source_url
            && self.reference_year == other.reference_year
    }

    /// URL for display, or an empty string.
    pub fn url_or_empty(&self) -> &str {
        self.source_url.as_deref().unwrap_or("")
    }

    /// Year for display, or an empty string.
    pub fn year_or_empty(&self) -> String {
        self.reference_year
            .map(|y| y.to_string())
            .unwrap_or_default()
    }
}

/// Confidence level declared by the reasoner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Lenient parse: case-insensitive, ignores surrounding text.
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        if upper.starts_with("HIGH") {
            Some(Self::High)
        } else if upper.starts_with("MED") {
            Some(Self::Medium)
        } else if upper.starts_with("LOW") {
            Some(Self::Low)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}
