//! LLM prompts for the discovery loop.
//!
//! Three prompt families, one per reasoner role:
//! - search: ask for the single best source URL and reference year
//! - judge: evaluate a candidate against a fixed rubric
//! - refine: rewrite a search prompt using the judge's feedback

use sha2::{Digest, Sha256};

use crate::types::{candidate::Candidate, feedback::Feedback, item::Item, item::SeedContext};

/// Prompt for finding the source of a financial attribute.
pub const SEARCH_PROMPT: &str = r#"You are a financial research expert specializing in locating authoritative, official financial data sources for multinational companies.

TASK: Identify the most authoritative, specific and up-to-date source for the "{variable}" of "{company_name}" (requested source type: {source_type}).

1. URL SELECTION
- Provide the MOST SPECIFIC URL linking directly to the document or filing that contains the data.
- Avoid generic URLs such as the company homepage or broad investor-relations landing pages.
- Prefer official investor-relations pages and regulator filings over aggregators.
- For U.S. companies SEC filings (10-K, 10-Q) are ideal; for EU companies ESEF/XBRL reports are preferred.
- PDF or XBRL documents are preferred over HTML pages.

2. REFERENCE YEAR
- Give the fiscal/reporting year of the data, NOT the publication year.
- {year_rule}

3. CONFIDENCE
- HIGH: official document from the company or a regulator with a clear fiscal year.
- MEDIUM: reliable financial database with recent data.
- LOW: indirect, outdated or generic source.
{context_section}
Return a JSON object ONLY, with exactly these fields and no extra text:
{
    "url": "EXACT_SOURCE_URL",
    "year": "REFERENCE_YEAR",
    "confidence": "HIGH/MEDIUM/LOW",
    "notes": "one sentence on why this source was chosen"
}"#;

/// Prompt for judging a candidate.
pub const JUDGE_PROMPT: &str = r#"You are an expert validator of financial sources for multinational companies.

CONTEXT:
- Company: {company_name}
- Requested attribute: {variable}
- Requested source type: {source_type}
{context_section}
RESULT TO VALIDATE:
- URL: {url}
- Reference year: {year}
- Declared confidence: {confidence}
- Notes: {notes}

Evaluate the result on each check independently:
1. url_accessible: the URL looks like a working, public link on an official domain (no login or paywall).
2. relevant: the document is about {company_name} and contains the {variable}.
3. specific: the URL points directly to a document or filing, not a homepage or generic landing page.
4. year_correct: the reference year matches the period covered by the document.
5. year_recent: {year_rule}

Return a JSON object ONLY:
{
    "url_accessible": true/false,
    "relevant": true/false,
    "specific": true/false,
    "year_correct": true/false,
    "year_recent": true/false,
    "score": 0-100,
    "explanation": "what is right or wrong with this result",
    "suggestions": "specific advice to find a better source"
}"#;

/// Prompt asking the reasoner to revise a search prompt.
pub const REFINE_PROMPT: &str = r#"You are an expert in prompt engineering for AI research assistants.

TASK: Improve the search prompt below so that the next attempt finds the {source_type} source for the "{variable}" of "{company_name}".

FEEDBACK FROM THE LAST ATTEMPT:
- Proposed URL: {url}
- Proposed year: {year}
- Failed checks: {failed_checks}
- Explanation: {explanation}
- Suggestions: {suggestions}

CURRENT PROMPT:
```
{previous_prompt}
```

INSTRUCTIONS:
1. Keep the general structure and the JSON response format of the prompt.
2. Add specific instructions that address the feedback above.
3. Ask for direct URLs to documents rather than pages that link to them.
4. Make the requested fiscal year explicit.
5. Mention "{company_name}" by name.

Return ONLY the new prompt, without explanations or comments."#;

/// SHA-256 fingerprint of a prompt.
pub fn prompt_hash(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// How the reference year must be chosen for an item.
pub fn year_rule(item: &Item) -> String {
    match item.pinned_year {
        Some(year) => format!("The reference year must be exactly {}.", year),
        None => "Choose the MOST RECENT period available.".to_string(),
    }
}

/// Format the search prompt for an item.
///
/// `hint` is a curated note about the company (see `hints`).
pub fn format_search_prompt(item: &Item, seed: &SeedContext, hint: Option<&str>) -> String {
    let mut context = String::new();
    if !seed.is_empty() {
        context.push_str("\nREFERENCES FOUND ON THE WEB (verify before use):\n");
        context.push_str(&seed.to_prompt_lines());
        context.push('\n');
        if let Some(domain) = seed.official_domain() {
            context.push_str(&format!("Likely official domain: {}\n", domain));
        }
    }
    if let Some(hint) = hint {
        context.push_str(&format!("\nADDITIONAL INFORMATION: {}\n", hint));
    }

    fill(
        SEARCH_PROMPT,
        &[
            ("company_name", item.name.as_str()),
            ("variable", item.variable.as_str()),
            ("source_type", item.source_type()),
            ("year_rule", year_rule(item).as_str()),
            ("context_section", context.as_str()),
        ],
    )
}

/// Format the judge prompt for a candidate.
pub fn format_judge_prompt(
    item: &Item,
    seed: &SeedContext,
    candidate: &Candidate,
    current_year: i32,
) -> String {
    let context = if seed.is_empty() {
        String::new()
    } else {
        format!("- Known references:\n{}\n", seed.to_prompt_lines())
    };
    let recency = match item.pinned_year {
        Some(year) => format!("the reference year is exactly {}.", year),
        None => format!(
            "the reference year is the most recent period available (today is in {}).",
            current_year
        ),
    };

    fill(
        JUDGE_PROMPT,
        &[
            ("company_name", item.name.as_str()),
            ("variable", item.variable.as_str()),
            ("source_type", item.source_type()),
            ("year_rule", recency.as_str()),
            ("context_section", context.as_str()),
            ("url", candidate.url_or_empty()),
            ("year", candidate.year_or_empty().as_str()),
            (
                "confidence",
                candidate.confidence.map(|c| c.as_str()).unwrap_or("N/A"),
            ),
            ("notes", candidate.notes.as_deref().unwrap_or("N/A")),
        ],
    )
}

/// Format the refine request sent to the reasoner.
pub fn format_refine_prompt(
    item: &Item,
    previous_prompt: &str,
    candidate: &Candidate,
    feedback: &Feedback,
) -> String {
    let year = candidate.year_or_empty();
    fill(
        REFINE_PROMPT,
        &[
            ("company_name", item.name.as_str()),
            ("variable", item.variable.as_str()),
            ("source_type", item.source_type()),
            ("url", or_not_found(candidate.url_or_empty())),
            ("year", or_not_found(&year)),
            ("failed_checks", failed_checks(feedback).as_str()),
            ("explanation", feedback.explanation.as_str()),
            ("suggestions", feedback.suggestions.as_deref().unwrap_or("N/A")),
            ("previous_prompt", previous_prompt),
        ],
    )
}

/// Deterministic refinement: the previous prompt plus the feedback as text.
pub fn append_feedback(
    previous_prompt: &str,
    round: usize,
    candidate: &Candidate,
    feedback: &Feedback,
) -> String {
    let mut text = format!(
        "{}\n\nFEEDBACK ON ATTEMPT {}:\n- Rejected URL: {}\n- Rejected year: {}\n- Failed checks: {}\n- Explanation: {}",
        previous_prompt.trim_end(),
        round + 1,
        or_not_found(candidate.url_or_empty()),
        or_not_found(&candidate.year_or_empty()),
        failed_checks(feedback),
        feedback.explanation,
    );
    if let Some(suggestions) = &feedback.suggestions {
        text.push_str(&format!("\n- Suggestions: {}", suggestions));
    }
    text.push_str("\nDo not propose the rejected URL again.");
    text
}

/// Substitute `{key}` placeholders in one pass.
///
/// Inserted values are never scanned again, so braces inside web text,
/// notes or feedback come through verbatim. Unknown `{...}` is kept as is.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let placeholder = tail.find('}').and_then(|close| {
            let key = &tail[1..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });

        match placeholder {
            Some((close, value)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn failed_checks(feedback: &Feedback) -> String {
    let failed = feedback.checks.failed();
    if failed.is_empty() {
        "none".to_string()
    } else {
        failed.join(", ")
    }
}

fn or_not_found(value: &str) -> &str {
    if value.is_empty() {
        "not found"
    } else {
        value
    }
}
