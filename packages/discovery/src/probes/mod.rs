//! Source probe implementations.
//!
//! - [`HttpProbe`] - crawls the company's own site (also a link checker)
//! - [`RateLimitedProbe`] - governor quota around any probe

mod http;
mod rate_limited;

pub use http::HttpProbe;
pub use rate_limited::{ProbeExt, RateLimitedProbe};
