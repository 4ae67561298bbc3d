//! Integration tests for the discovery loop and orchestrator.
//!
//! These tests drive whole items through the public API:
//! 1. Search with a scripted reasoner
//! 2. Parse and judge each candidate
//! 3. Refine on rejection
//! 4. Collect one outcome per item, in input order

use std::sync::Arc;
use std::time::Duration;

use discovery::{
    table::{write_results_to, DEFAULT_DELIMITER},
    testing::{MockLinkChecker, Scripted, ScriptedReasoner},
    DiscoveryConfig, DiscoveryLoop, Item, Orchestrator, ResultTable, Role, RoundStatus,
};
use proptest::prelude::*;

const ALL_PASS: &str = r#"{"url_accessible": true, "relevant": true, "specific": true,
    "year_correct": true, "year_recent": true, "explanation": "direct link to the report"}"#;
const HOMEPAGE: &str = r#"{"url_accessible": true, "relevant": true, "specific": false,
    "year_correct": true, "year_recent": true, "explanation": "generic homepage",
    "suggestions": "link the annual report PDF"}"#;

const COMPANIES: [&str; 6] = [
    "Acme Corp",
    "Globex",
    "Initech",
    "Umbrella Holdings",
    "Hooli",
    "Wayne Holdings",
];

fn config(rounds: usize, workers: usize) -> DiscoveryConfig {
    DiscoveryConfig::new()
        .with_max_rounds(rounds)
        .with_max_concurrency(workers)
        .with_call_timeout(Duration::from_secs(5))
}

fn found(url: &str, year: i32) -> Scripted {
    Ok(format!(r#"{{"url": "{}", "year": "{}"}}"#, url, year))
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

fn items(names: &[&str]) -> Vec<Item> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Item::new((i + 1).to_string(), *name, "turnover"))
        .collect()
}

/// Answers depend only on prompt text, so every run sees the same results.
///
/// Companies whose name contains "Holdings" never get past the homepage.
fn deterministic_reasoner() -> ScriptedReasoner {
    ScriptedReasoner::new()
        .with_responder(|prompt, role| {
            let name = COMPANIES
                .into_iter()
                .find(|name| prompt.contains(name))?;
            let home = format!("https://{}.example.com", slug(name));

            match role {
                Role::Search
                    if prompt.contains("FEEDBACK ON ATTEMPT") && !name.contains("Holdings") =>
                {
                    Some(found(&format!("{}/ar-2024.pdf", home), 2024))
                }
                Role::Search => Some(found(&home, 2024)),
                Role::Judge if prompt.contains("ar-2024.pdf") => Some(Ok(ALL_PASS.into())),
                Role::Judge => Some(Ok(HOMEPAGE.into())),
                Role::Refine => None,
            }
        })
        .with_refine_failure("refinement unavailable")
}

fn csv_of(table: &ResultTable) -> String {
    let mut buffer = Vec::new();
    write_results_to(&mut buffer, table, DEFAULT_DELIMITER).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[tokio::test]
async fn test_invalid_url_then_valid_url_is_accepted_in_second_round() {
    let reasoner = Arc::new(
        ScriptedReasoner::new()
            .with_search(vec![
                Ok(r#"{"url": "see the investor page", "year": "2024"}"#.into()),
                found("https://acme.com/ar-2024.pdf", 2024),
            ])
            .with_judge(vec![Ok(ALL_PASS.into())])
            .with_refine_failure("refinement unavailable"),
    );
    let discovery = DiscoveryLoop::new(reasoner.clone(), config(3, 1)).with_current_year(2025);

    let outcome = discovery.run(&Item::new("1", "Acme Corp", "turnover")).await;

    assert!(outcome.validated);
    assert_eq!(outcome.rounds_used, 2);
    assert_eq!(outcome.history[0].status, RoundStatus::ParseFailed);
    assert_eq!(
        outcome.final_candidate.source_url.as_deref(),
        Some("https://acme.com/ar-2024.pdf")
    );
    assert_eq!(outcome.final_candidate.reference_year, Some(2024));
    // The URL-less candidate is rejected without asking the judge
    assert_eq!(reasoner.calls_for(Role::Judge), 1);
}

#[tokio::test]
async fn test_unparseable_responses_exhaust_the_budget() {
    let reasoner = Arc::new(
        ScriptedReasoner::new()
            .with_default(Role::Search, Ok("I could not find any report for this company.".into()))
            .with_refine_failure("refinement unavailable"),
    );
    let table = Orchestrator::new(DiscoveryLoop::new(reasoner.clone(), config(3, 2)))
        .run(&items(&["Acme Corp"]))
        .await;

    let outcome = &table.outcomes()[0];
    assert!(!outcome.validated);
    assert_eq!(outcome.rounds_used, 3);
    assert!(outcome.final_candidate.is_empty());
    assert!(outcome
        .history
        .iter()
        .all(|round| round.status == RoundStatus::ParseFailed));
    assert_eq!(reasoner.calls_for(Role::Search), 3);
    assert_eq!(reasoner.calls_for(Role::Judge), 0);

    let csv = csv_of(&table);
    assert!(csv.lines().nth(1).unwrap().starts_with("1;Acme Corp;turnover;;;false;3;"));
}

#[tokio::test]
async fn test_rejection_feedback_reaches_next_prompt() {
    let reasoner = Arc::new(
        ScriptedReasoner::new()
            .with_search(vec![
                found("https://acme.com", 2024),
                found("https://acme.com/ar-2024.pdf", 2024),
            ])
            .with_judge(vec![Ok(HOMEPAGE.into()), Ok(ALL_PASS.into())])
            .with_refine_failure("refinement unavailable"),
    );
    let outcome = DiscoveryLoop::new(reasoner.clone(), config(3, 1))
        .with_current_year(2025)
        .run(&Item::new("1", "Acme Corp", "turnover"))
        .await;

    assert!(outcome.validated);
    let second = &outcome.history[1].prompt;
    assert!(second.contains("https://acme.com"));
    assert!(second.contains("generic homepage"));
    assert!(second.contains("specific"));
    assert_ne!(outcome.history[0].prompt_hash, outcome.history[1].prompt_hash);
}

#[tokio::test]
async fn test_refined_prompt_changes_the_search() {
    let refined = "Search Acme Corp's investor relations site for the 2024 annual report. \
                   Return the direct PDF link, not the homepage of the company.";
    let reasoner = Arc::new(
        ScriptedReasoner::new()
            .with_refine(vec![Ok(refined.into())])
            .with_responder(|prompt, role| match role {
                Role::Search if prompt.contains("direct PDF link") => {
                    Some(found("https://acme.com/ar-2024.pdf", 2024))
                }
                Role::Search => Some(found("https://acme.com", 2024)),
                Role::Judge if prompt.contains("ar-2024.pdf") => Some(Ok(ALL_PASS.into())),
                Role::Judge => Some(Ok(HOMEPAGE.into())),
                Role::Refine => None,
            }),
    );
    let outcome = DiscoveryLoop::new(reasoner.clone(), config(3, 1))
        .with_current_year(2025)
        .run(&Item::new("1", "Acme Corp", "turnover"))
        .await;

    assert!(outcome.validated);
    assert_eq!(outcome.rounds_used, 2);
    assert_eq!(outcome.history[1].prompt, refined);
    assert_eq!(reasoner.calls_for(Role::Refine), 1);
}

#[tokio::test]
async fn test_unreachable_link_is_rejected_before_judging() {
    let reasoner = Arc::new(
        ScriptedReasoner::new()
            .with_search(vec![
                found("https://acme.com/old-report.pdf", 2024),
                found("https://acme.com/ar-2024.pdf", 2024),
            ])
            .with_default(Role::Judge, Ok(ALL_PASS.into()))
            .with_refine_failure("refinement unavailable"),
    );
    let checker = Arc::new(
        MockLinkChecker::new().with_unreachable("https://acme.com/old-report.pdf", "HTTP 404"),
    );
    let outcome = DiscoveryLoop::new(reasoner.clone(), config(3, 1))
        .with_link_checker(checker.clone())
        .with_current_year(2025)
        .run(&Item::new("1", "Acme Corp", "turnover"))
        .await;

    assert!(outcome.validated);
    assert_eq!(outcome.rounds_used, 2);
    assert!(!outcome.history[0].feedback.checks.url_accessible);
    assert_eq!(reasoner.calls_for(Role::Judge), 1);
    assert_eq!(checker.calls().len(), 2);
}

#[tokio::test]
async fn test_pinned_year_mismatch_is_rejected() {
    let reasoner = Arc::new(
        ScriptedReasoner::new()
            .with_search(vec![found("https://acme.com/ar-2024.pdf", 2024)])
            .with_default(Role::Judge, Ok(ALL_PASS.into())),
    );
    let item = Item::new("1", "Acme Corp", "turnover").with_pinned_year(2022);
    let outcome = DiscoveryLoop::new(reasoner, config(1, 1))
        .with_current_year(2025)
        .run(&item)
        .await;

    assert!(!outcome.validated);
    assert!(!outcome.history[0].feedback.checks.year_correct);
    assert!(outcome.feedback_summary().contains("2022"));
}

#[tokio::test]
async fn test_concurrency_does_not_change_results() {
    let input = items(&COMPANIES);

    let sequential = Orchestrator::new(
        DiscoveryLoop::new(Arc::new(deterministic_reasoner()), config(3, 1))
            .with_current_year(2025),
    )
    .run(&input)
    .await;
    let parallel = Orchestrator::new(
        DiscoveryLoop::new(
            Arc::new(deterministic_reasoner().with_latency(Duration::from_millis(3))),
            config(3, 8),
        )
        .with_current_year(2025),
    )
    .run(&input)
    .await;

    assert_eq!(csv_of(&sequential), csv_of(&parallel));

    let summary = parallel.summary();
    assert_eq!(summary.total, 6);
    assert_eq!(summary.validated, 4);
    assert_eq!(summary.exhausted, 2);

    let holdings = &parallel.outcomes()[3];
    assert_eq!(holdings.item.name, "Umbrella Holdings");
    assert!(!holdings.validated);
    assert_eq!(holdings.rounds_used, 3);
    assert_eq!(
        holdings.final_candidate.source_url.as_deref(),
        Some("https://umbrella-holdings.example.com")
    );
}

#[tokio::test]
async fn test_one_crashing_item_does_not_sink_the_batch() {
    let reasoner = Arc::new(deterministic_reasoner().with_panic_on("Initech"));
    let table = Orchestrator::new(
        DiscoveryLoop::new(reasoner, config(3, 4)).with_current_year(2025),
    )
    .run(&items(&["Acme Corp", "Initech", "Globex"]))
    .await;

    assert_eq!(table.len(), 3);
    let crashed = &table.outcomes()[1];
    assert_eq!(crashed.item.name, "Initech");
    assert!(!crashed.validated);
    assert!(crashed.failure.is_some());
    assert!(table.outcomes()[0].validated);
    assert!(table.outcomes()[2].validated);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_one_row_per_item_in_order(
        picks in prop::collection::vec(0usize..6, 0..12),
        rounds in 1usize..5,
        workers in 1usize..6,
    ) {
        let input: Vec<Item> = picks
            .iter()
            .enumerate()
            .map(|(i, pick)| Item::new(i.to_string(), COMPANIES[*pick], "turnover"))
            .collect();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let table = runtime.block_on(
            Orchestrator::new(
                DiscoveryLoop::new(Arc::new(deterministic_reasoner()), config(rounds, workers))
                    .with_current_year(2025),
            )
            .run(&input),
        );

        prop_assert_eq!(table.len(), input.len());
        for (outcome, item) in table.iter().zip(&input) {
            prop_assert_eq!(&outcome.item.id, &item.id);
            prop_assert!(outcome.rounds_used >= 1 && outcome.rounds_used <= rounds);
            prop_assert_eq!(outcome.rounds_used, outcome.history.len());
            if outcome.validated {
                prop_assert!(outcome.history.last().unwrap().feedback.accepted());
            }
        }
    }
}
