//! HTTP source probe using reqwest + scraper.
//!
//! Seeding strategy:
//! 1. Guess the official domain from the company name (legal suffixes removed)
//! 2. Find the investor-relations page through keyword links on the homepage
//! 3. Collect report documents whose link text or href matches the source
//!    type and mentions a year, most recent first
//!
//! A guessed domain that does not answer is "not found", not an error.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use tokio::time::sleep;
use url::Url;

use crate::error::{DiscoveryError, Result};
use crate::pipeline::parse::year_in_text;
use crate::traits::probe::{LinkChecker, LinkStatus, ProbeHit, SourceProbe};
use crate::types::config::RetryPolicy;
use crate::types::item::known_source_type;

/// Reports returned per probe.
const MAX_REPORT_HITS: usize = 10;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static RE_LEGAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(inc|corp|corporation|ltd|limited|llc|plc|group|holding|holdings|co|ag|se|sa|spa|nv)\b")
        .unwrap()
});

const STOP_TOKENS: &[&str] = &["the", "and"];

const IR_KEYWORDS: &[&str] = &[
    "investor",
    "investors",
    "investor relations",
    "ir/",
    "financials",
    "shareholders",
    "financial information",
    "annual report",
    "quarterly report",
];

const DOCUMENT_SUFFIXES: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".xhtml", ".html", ".zip",
];

/// Probe that crawls a company's own website.
#[derive(Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpProbe {
    pub fn new() -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| DiscoveryError::Transport(Box::new(e)))?;

        Ok(Self {
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Set the per-request retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch a page. `Ok(None)` means the server answered with a non-success
    /// status; transport errors are retried, then returned.
    async fn fetch_html(&self, url: &str) -> Result<Option<String>> {
        let mut attempt = 1;
        loop {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        tracing::debug!(url, %status, "Non-success status");
                        return Ok(None);
                    }
                    return response
                        .text()
                        .await
                        .map(Some)
                        .map_err(|e| DiscoveryError::Transport(Box::new(e)));
                }
                Err(e) if attempt < self.retry.max_attempts && !e.is_connect() => {
                    tracing::debug!(url, error = %e, attempt, "Fetch failed, retrying...");
                    sleep(self.retry.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(DiscoveryError::Transport(Box::new(e))),
            }
        }
    }

    /// First guessed domain that answers, with its homepage.
    async fn find_official_site(&self, item_name: &str) -> Option<(Url, String)> {
        for candidate in candidate_domains(item_name) {
            match self.fetch_html(&candidate).await {
                Ok(Some(html)) => {
                    let url = Url::parse(&candidate).ok()?;
                    return Some((url, html));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(url = %candidate, error = %e, "Guessed domain unreachable");
                }
            }
        }
        None
    }
}

#[async_trait]
impl SourceProbe for HttpProbe {
    async fn probe(&self, item_name: &str, source_type: &str) -> Result<Vec<ProbeHit>> {
        let Some((site, homepage)) = self.find_official_site(item_name).await else {
            tracing::info!(item_name, "No official site found");
            return Ok(Vec::new());
        };

        let mut hits = vec![ProbeHit::new(site.as_str(), "official site")];

        let (reports_base, reports_html) = match find_ir_page(&homepage, &site) {
            Some(ir_page) => {
                hits.push(ProbeHit::new(ir_page.as_str(), "investor relations page"));
                let fetched = self.fetch_html(ir_page.as_str()).await;
                reports_page(site, homepage, ir_page, fetched)
            }
            None => (site, homepage),
        };

        let reports = find_reports(&reports_html, &reports_base, source_type);
        tracing::info!(item_name, reports = reports.len(), "Probe finished");
        hits.extend(reports);
        Ok(hits)
    }
}

#[async_trait]
impl LinkChecker for HttpProbe {
    async fn check(&self, url: &str) -> LinkStatus {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if matches!(status.as_u16(), 403 | 404 | 410) {
                    LinkStatus::Unreachable {
                        reason: format!("HTTP {}", status.as_u16()),
                    }
                } else {
                    LinkStatus::Reachable
                }
            }
            Err(e) => LinkStatus::Unreachable {
                reason: e.to_string(),
            },
        }
    }
}

/// Page to collect report links from: the IR page when it loaded, the
/// homepage otherwise. A failed IR fetch keeps the hits found so far.
fn reports_page(
    site: Url,
    homepage: String,
    ir_page: Url,
    fetched: Result<Option<String>>,
) -> (Url, String) {
    match fetched {
        Ok(Some(html)) => (ir_page, html),
        Ok(None) => (site, homepage),
        Err(e) => {
            tracing::warn!(url = %ir_page, error = %e, "IR page fetch failed, using homepage");
            (site, homepage)
        }
    }
}

/// Significant name tokens: lowercase, legal suffixes and stop words removed.
///
/// Two-letter tokens ("HP Inc", "3i Group") count only when nothing longer
/// is left.
fn name_tokens(name: &str) -> Vec<String> {
    let lowered = name.to_lowercase();
    let cleaned = RE_LEGAL_SUFFIX.replace_all(&lowered, " ");
    let tokens: Vec<&str> = cleaned
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2 && !STOP_TOKENS.contains(t))
        .collect();

    let min_len = if tokens.iter().any(|t| t.len() > 2) { 3 } else { 2 };
    tokens
        .into_iter()
        .filter(|t| t.len() >= min_len)
        .map(str::to_string)
        .collect()
}

/// Homepage URLs to try for a company, most likely first.
fn candidate_domains(name: &str) -> Vec<String> {
    let tokens = name_tokens(name);
    let Some(first) = tokens.first() else {
        return Vec::new();
    };

    let joined = match tokens.get(1) {
        Some(second) => format!("{}{}", first, second),
        None => first.clone(),
    };

    let mut domains = vec![
        format!("https://www.{}.com/", joined),
        format!("https://{}.com/", joined),
        format!("https://www.{}.org/", joined),
        format!("https://www.{}.com/", first),
    ];
    let mut seen = HashSet::new();
    domains.retain(|d| seen.insert(d.clone()));
    domains
}

fn link_selector() -> Option<Selector> {
    Selector::parse("a[href]").ok()
}

/// Investor-relations link on a homepage.
fn find_ir_page(html: &str, base: &Url) -> Option<Url> {
    let selector = link_selector()?;
    let document = Html::parse_document(html);

    document.select(&selector).find_map(|link| {
        let href = link.value().attr("href")?;
        let text = link.text().collect::<String>().to_lowercase();
        let href_lower = href.to_lowercase();
        IR_KEYWORDS
            .iter()
            .any(|k| text.contains(k) || href_lower.contains(k))
            .then(|| base.join(href).ok())
            .flatten()
            .filter(|url| url.scheme() == "http" || url.scheme() == "https")
    })
}

/// Keywords identifying a report of the requested type.
fn report_keywords(source_type: &str) -> &'static [&'static str] {
    match known_source_type(source_type) {
        Some("Annual Report") => &[
            "annual report",
            "annual filing",
            "10-k",
            "yearly report",
            "annual financial report",
            "year-end report",
            "universal registration document",
        ],
        Some("Quarterly Report") => {
            &["quarterly report", "quarterly filing", "10-q", "q1", "q2", "q3", "q4"]
        }
        Some("Consolidated Report") => &[
            "consolidated financial",
            "consolidated statement",
            "consolidated report",
            "consolidated results",
        ],
        _ => &[
            "financial report",
            "financial statement",
            "financial results",
            "earnings report",
            "annual report",
        ],
    }
}

/// Report documents on a page, most recent first.
fn find_reports(html: &str, base: &Url, source_type: &str) -> Vec<ProbeHit> {
    let Some(selector) = link_selector() else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let keywords = report_keywords(source_type);

    let mut hits: Vec<ProbeHit> = document
        .select(&selector)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let text = link.text().collect::<String>();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let (text_lower, href_lower) = (text.to_lowercase(), href.to_lowercase());

            let is_report = keywords
                .iter()
                .any(|k| text_lower.contains(k) || href_lower.contains(k));
            let path = href_lower.split(['?', '#']).next().unwrap_or("");
            let is_document = DOCUMENT_SUFFIXES.iter().any(|s| path.ends_with(s))
                || href_lower.contains("download");
            if !is_report || !is_document {
                return None;
            }

            let year = year_in_text(&text).or_else(|| year_in_text(href))?;
            let url = base.join(href).ok()?;
            let context = if text.is_empty() { source_type.to_string() } else { text };
            Some(ProbeHit::new(url.as_str(), context).with_year(year))
        })
        .collect();

    hits.sort_by(|a, b| b.year.cmp(&a.year));
    let mut seen = HashSet::new();
    hits.retain(|hit| seen.insert(hit.url.clone()));
    hits.truncate(MAX_REPORT_HITS);
    hits
}
