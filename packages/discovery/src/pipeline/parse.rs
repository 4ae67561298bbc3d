//! Lenient parsing of reasoner responses.
//!
//! Reasoners wrap their JSON in prose and code fences, quote numbers, and
//! rename fields. Parsing takes the outermost `{...}` of the response and
//! reads each field tolerantly. Anything that still cannot be read is an
//! error, never a guess.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{DiscoveryError, Result};
use crate::types::candidate::{Candidate, Confidence};
use crate::types::feedback::{Checks, Feedback};

static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:19|20)\d{2}").unwrap());

const URL_KEYS: &[&str] = &["url", "source_url", "link"];
const YEAR_KEYS: &[&str] = &["year", "reference_year", "refyear", "fiscal_year"];
const NOTES_KEYS: &[&str] = &["notes", "source_description", "description"];
const CHECK_KEYS: &[&str] = &[
    "url_accessible",
    "relevant",
    "specific",
    "year_correct",
    "year_recent",
];

/// Parse a search response into a candidate.
///
/// Fails when the response has no JSON object or when neither a usable URL
/// nor a usable year can be read from it.
pub fn parse_candidate(raw: &str) -> Result<Candidate> {
    let object = extract_object(raw)?;

    let source_url = first_str(&object, URL_KEYS).and_then(normalize_url);
    let reference_year = first_value(&object, YEAR_KEYS).and_then(parse_year);

    if source_url.is_none() && reference_year.is_none() {
        return Err(DiscoveryError::parse("response has neither a URL nor a year"));
    }

    Ok(Candidate {
        source_url,
        reference_year,
        confidence: first_str(&object, &["confidence"]).and_then(Confidence::parse),
        notes: first_str(&object, NOTES_KEYS)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

/// Parse a judge response into feedback.
///
/// Missing checks count as failed. A response with none of the checks is
/// not a verdict.
pub fn parse_verdict(raw: &str) -> Result<Feedback> {
    let object = extract_object(raw).map_err(|e| DiscoveryError::validation(e.to_string()))?;

    if !CHECK_KEYS.iter().any(|key| lookup(&object, key).is_some()) {
        return Err(DiscoveryError::validation("response contains no rubric checks"));
    }

    let check = |key: &str| lookup(&object, key).map(as_bool).unwrap_or(false);
    let checks = Checks {
        url_accessible: check("url_accessible"),
        relevant: check("relevant"),
        specific: check("specific"),
        year_correct: check("year_correct"),
        year_recent: check("year_recent"),
    };

    let explanation = first_str(&object, &["explanation", "feedback"])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("no explanation given");

    let mut feedback = Feedback::from_checks(checks, explanation);
    if let Some(suggestions) = first_str(&object, &["suggestions", "improvement_suggestions"])
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        feedback = feedback.with_suggestions(suggestions);
    }
    if let Some(score) = first_value(&object, &["score", "validation_score"]).and_then(as_score) {
        feedback = feedback.with_score(score);
    }
    Ok(feedback)
}

/// Read a reference year from a JSON value.
///
/// Accepts `2023`, `"2023"`, `"FY2023"` and ranges like `"2023-2024"`
/// (the later year wins).
pub fn parse_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .filter(|y| (1900..=2100).contains(y))
            .map(|y| y as i32),
        Value::String(s) => year_in_text(s),
        _ => None,
    }
}

/// Latest four-digit year (1900-2099) mentioned in free text.
pub fn year_in_text(text: &str) -> Option<i32> {
    RE_YEAR
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i32>().ok())
        .max()
}

fn extract_object(raw: &str) -> Result<Map<String, Value>> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let slice = match (start, end) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => return Err(DiscoveryError::parse("no JSON object in response")),
    };

    match serde_json::from_str::<Value>(slice) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DiscoveryError::parse("response JSON is not an object")),
        Err(e) => Err(DiscoveryError::parse(format!("invalid JSON: {}", e))),
    }
}

/// Case-insensitive key lookup.
fn lookup<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object
        .get(key)
        .or_else(|| {
            object
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
        .filter(|v| !v.is_null())
}

fn first_value<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| lookup(object, key))
}

fn first_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| lookup(object, key)?.as_str())
}

fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(|c| c == '<' || c == '>');
    let url = Url::parse(trimmed).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(trimmed.to_string()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "pass"),
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    }
}

fn as_score(value: &Value) -> Option<u8> {
    let score = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok()?,
        _ => return None,
    };
    (score >= 0.0).then(|| score.min(100.0).round() as u8)
}
