//! Items (one input row) and the seed context gathered for them.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::traits::probe::ProbeHit;

/// Source type assumed when the input row does not name one.
pub const DEFAULT_SOURCE_TYPE: &str = "Annual Report";

/// One (company, requested attribute) unit of work.
///
/// Items are immutable once loaded; the loop only ever borrows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier from the input table (kept verbatim)
    pub id: String,

    /// Company name
    pub name: String,

    /// Requested financial attribute (e.g., "turnover", "employees")
    pub variable: String,

    /// Kind of document to look for (e.g., "Annual Report", "Quarterly")
    #[serde(default)]
    pub source_type: Option<String>,

    /// Exact reference year demanded by the row, if any.
    ///
    /// When set, the year-recency check compares against this year instead
    /// of "most recent available".
    #[serde(default)]
    pub pinned_year: Option<i32>,
}

impl Item {
    /// Create a new item.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        variable: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            variable: variable.into(),
            source_type: None,
            pinned_year: None,
        }
    }

    /// Set the source type hint.
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    /// Pin the reference year.
    pub fn with_pinned_year(mut self, year: i32) -> Self {
        self.pinned_year = Some(year);
        self
    }

    /// Source type to search for, falling back to annual reports.
    pub fn source_type(&self) -> &str {
        self.source_type
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SOURCE_TYPE)
    }
}

/// Canonical name of a recognised document kind, if `value` names one.
///
/// Accepts the short and long forms ("annual", "Annual Report"), case
/// insensitive. Row classifiers such as `FIN_REP` are not document kinds.
pub fn known_source_type(value: &str) -> Option<&'static str> {
    match value.trim().to_lowercase().as_str() {
        "annual" | "annual report" => Some("Annual Report"),
        "quarterly" | "quarterly report" => Some("Quarterly Report"),
        "consolidated" | "consolidated report" => Some("Consolidated Report"),
        _ => None,
    }
}

/// Reference context gathered once per item during seeding.
///
/// An empty seed is valid: probing failures never stop the loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedContext {
    /// Hits returned by the source probe, most relevant first
    pub references: Vec<ProbeHit>,
}

impl SeedContext {
    /// An empty seed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a seed from probe hits.
    pub fn from_hits(references: Vec<ProbeHit>) -> Self {
        Self { references }
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Host of the first reference, taken as the likely official domain.
    pub fn official_domain(&self) -> Option<String> {
        self.references
            .iter()
            .find_map(|hit| Url::parse(&hit.url).ok()?.host_str().map(str::to_string))
    }

    /// Render the references as prompt lines (`- url (context)`).
    pub fn to_prompt_lines(&self) -> String {
        self.references
            .iter()
            .map(|hit| {
                let mut line = format!("- {}", hit.url);
                if !hit.context.is_empty() {
                    line.push_str(&format!(" ({})", hit.context));
                }
                if let Some(year) = hit.year {
                    line.push_str(&format!(" [year {}]", year));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
