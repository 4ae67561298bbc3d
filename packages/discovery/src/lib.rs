//! Financial Source Discovery Library
//!
//! Finds, for each company in an input list, an authoritative source URL and
//! reference year for a requested financial attribute. A reasoning service
//! proposes candidates, an independent judge validates them, and rejected
//! candidates feed a refined prompt for the next round.
//!
//! # Design Philosophy
//!
//! - Bounded: at most `max_rounds` rounds per item, every external call timed out
//! - Fail-closed: a judge that cannot decide never accepts
//! - Lossless: every round is recorded, accepted or not
//! - Deterministic output: one row per item, in input order, regardless of
//!   completion order
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use discovery::{DiscoveryConfig, DiscoveryLoop, Item, Orchestrator};
//! use discovery::testing::ScriptedReasoner;
//!
//! let reasoner = Arc::new(ScriptedReasoner::new());
//! let discovery = DiscoveryLoop::new(reasoner, DiscoveryConfig::default());
//!
//! let items = vec![Item::new("1", "Acme Corp", "turnover")];
//! let table = Orchestrator::new(discovery).run(&items).await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (Reasoner, SourceProbe, LinkChecker)
//! - [`types`] - Items, candidates, feedback, rounds, outcomes, config
//! - [`pipeline`] - Prompt building, parsing, judging, the loop, the orchestrator
//! - [`reasoners`] - Reasoner implementations (OpenAI, retry wrapper)
//! - [`probes`] - Probe implementations (HTTP, rate limiter)
//! - [`table`] - Input/output tables and the run report
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod pipeline;
pub mod probes;
pub mod reasoners;
pub mod security;
pub mod table;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{DiscoveryError, FailureKind, Result};
pub use traits::{
    probe::{LinkChecker, LinkStatus, ProbeHit, SourceProbe},
    reasoner::{Reasoner, Role},
};
pub use types::{
    candidate::{Candidate, Confidence},
    config::{DiscoveryConfig, RetryPolicy},
    feedback::{Checks, Feedback},
    item::{Item, SeedContext, DEFAULT_SOURCE_TYPE},
    outcome::{Outcome, ResultTable, Strategy, TableSummary},
    round::{PromptState, Round, RoundStatus},
};

// Re-export pipeline components
pub use pipeline::{DiscoveryLoop, Judge, Orchestrator, PromptBuilder};

// Re-export adapters
pub use probes::{HttpProbe, ProbeExt, RateLimitedProbe};
#[cfg(feature = "openai")]
pub use reasoners::OpenAiReasoner;
pub use reasoners::{ReasonerExt, RetryingReasoner};
