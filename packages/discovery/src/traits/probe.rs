//! Source probe trait for seeding and link checks.
//!
//! A probe performs external retrieval (official site, investor-relations
//! page, filing links) to gather reference facts about a company before the
//! first search round. It is a pure lookup: no iteration, no reasoning.
//!
//! "Not found" is an empty list, never an error. Errors are reserved for
//! transport-level failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A reference fact found by a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeHit {
    /// The discovered URL
    pub url: String,

    /// What this URL is (e.g., "official site", "investor relations page",
    /// link text of a report)
    pub context: String,

    /// Reference year detected in the link text or URL
    #[serde(default)]
    pub year: Option<i32>,
}

impl ProbeHit {
    /// Create a new hit.
    pub fn new(url: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            context: context.into(),
            year: None,
        }
    }

    /// Add a detected year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

/// External retrieval of reference context for an item.
#[async_trait]
pub trait SourceProbe: Send + Sync {
    /// Look up reference facts for a company and requested source type.
    async fn probe(&self, item_name: &str, source_type: &str) -> Result<Vec<ProbeHit>>;
}

#[async_trait]
impl<P: SourceProbe + ?Sized> SourceProbe for std::sync::Arc<P> {
    async fn probe(&self, item_name: &str, source_type: &str) -> Result<Vec<ProbeHit>> {
        (**self).probe(item_name, source_type).await
    }
}

/// Result of checking whether a URL can be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// The URL answered with a success status
    Reachable,

    /// The URL answered 403/404 or could not be fetched
    Unreachable { reason: String },
}

impl LinkStatus {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable)
    }
}

/// Reachability check used by the judge before asking the reasoner.
#[async_trait]
pub trait LinkChecker: Send + Sync {
    async fn check(&self, url: &str) -> LinkStatus;
}

#[async_trait]
impl<L: LinkChecker + ?Sized> LinkChecker for std::sync::Arc<L> {
    async fn check(&self, url: &str) -> LinkStatus {
        (**self).check(url).await
    }
}
