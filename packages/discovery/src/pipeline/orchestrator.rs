//! Bounded-concurrency runner for many discovery loops.
//!
//! Work runs out of order on a fixed-size pool; the result table is always
//! in input order. Each worker writes only its own slot, and a worker that
//! panics is isolated and reported as a failed outcome for its item.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::pipeline::discovery_loop::DiscoveryLoop;
use crate::types::item::Item;
use crate::types::outcome::{Outcome, ResultTable};

/// Runs one discovery loop per item with at most `max_concurrency` active.
#[derive(Clone)]
pub struct Orchestrator {
    discovery: DiscoveryLoop,
}

impl Orchestrator {
    pub fn new(discovery: DiscoveryLoop) -> Self {
        Self { discovery }
    }

    /// Run every item to a terminal outcome.
    ///
    /// Returns exactly one outcome per item, in input order, whatever
    /// happens inside individual loops.
    pub async fn run(&self, items: &[Item]) -> ResultTable {
        let run_id = Uuid::now_v7();
        let workers = worker_count(self.discovery.config().max_concurrency, items.len());
        let semaphore = Arc::new(Semaphore::new(workers));

        tracing::info!(
            %run_id,
            items = items.len(),
            workers,
            max_rounds = self.discovery.config().max_rounds,
            "Starting discovery run"
        );

        let mut tasks = JoinSet::new();
        for (index, item) in items.iter().cloned().enumerate() {
            // Admission: wait for a free worker before spawning.
            let permit = semaphore.clone().acquire_owned().await.ok();
            let discovery = self.discovery.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = match AssertUnwindSafe(discovery.run(&item)).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => {
                        let message = panic_message(&panic);
                        tracing::error!(
                            item_id = %item.id,
                            panic = %message,
                            "Discovery worker panicked"
                        );
                        Outcome::failed(item.clone(), message)
                    }
                };
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<Outcome>> = vec![None; items.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => match slots.get_mut(index) {
                    Some(slot) if slot.is_none() => *slot = Some(outcome),
                    Some(_) => {
                        tracing::error!(index, "Outcome slot written twice; keeping the first")
                    }
                    None => tracing::error!(index, "Outcome index out of range"),
                },
                Err(e) => tracing::error!(error = %e, "Discovery task did not complete"),
            }
        }

        let outcomes: Vec<Outcome> = slots
            .into_iter()
            .zip(items)
            .map(|(slot, item)| {
                slot.unwrap_or_else(|| {
                    Outcome::failed(item.clone(), "worker did not report an outcome")
                })
            })
            .collect();

        let table = ResultTable::new(run_id, outcomes);
        let summary = table.summary();
        tracing::info!(
            %run_id,
            total = summary.total,
            validated = summary.validated,
            exhausted = summary.exhausted,
            failed = summary.failed,
            "Discovery run complete"
        );
        table
    }
}

/// Workers actually started: at least one, no more than there are items,
/// and within what a semaphore can hold.
fn worker_count(max_concurrency: usize, items: usize) -> usize {
    max_concurrency
        .min(items)
        .clamp(1, Semaphore::MAX_PERMITS)
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedReasoner;
    use crate::traits::reasoner::Role;
    use crate::types::config::DiscoveryConfig;
    use std::time::Duration;

    const ALL_PASS: &str = r#"{"url_accessible": true, "relevant": true, "specific": true,
        "year_correct": true, "year_recent": true, "explanation": "direct link"}"#;

    fn orchestrator(reasoner: Arc<ScriptedReasoner>, workers: usize) -> Orchestrator {
        let config = DiscoveryConfig::new()
            .with_max_rounds(2)
            .with_max_concurrency(workers)
            .with_call_timeout(Duration::from_secs(5));
        Orchestrator::new(DiscoveryLoop::new(reasoner, config))
    }

    fn items(names: &[&str]) -> Vec<Item> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Item::new(i.to_string(), *name, "turnover"))
            .collect()
    }

    #[tokio::test]
    async fn test_panicking_worker_is_isolated() {
        let reasoner = Arc::new(
            ScriptedReasoner::new()
                .with_default(
                    Role::Search,
                    Ok(r#"{"url": "https://example.com/ar.pdf", "year": 2024}"#.into()),
                )
                .with_default(Role::Judge, Ok(ALL_PASS.into()))
                .with_panic_on("Boom Industries"),
        );
        let table = orchestrator(reasoner, 2)
            .run(&items(&["Acme Corp", "Boom Industries", "Globex"]))
            .await;

        assert_eq!(table.len(), 3);
        let outcomes = table.outcomes();
        assert!(outcomes[0].validated);
        assert!(!outcomes[1].validated);
        assert_eq!(outcomes[1].rounds_used, 0);
        assert!(outcomes[1].feedback_summary().starts_with("worker failure"));
        assert!(outcomes[2].validated);
        assert_eq!(table.summary().failed, 1);
    }

    #[tokio::test]
    async fn test_output_follows_input_order() {
        let reasoner = Arc::new(
            ScriptedReasoner::new()
                .with_default(Role::Search, Err("offline".into()))
                .with_refine_failure("offline")
                .with_latency(Duration::from_millis(5)),
        );
        let input = items(&["C", "A", "B", "D"]);
        let table = orchestrator(reasoner, 3).run(&input).await;

        let names: Vec<_> = table.iter().map(|o| o.item.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B", "D"]);
        assert!(table.iter().all(|o| o.rounds_used == 2 && !o.validated));
    }

    #[test]
    fn test_worker_count_is_bounded() {
        assert_eq!(worker_count(4, 10), 4);
        assert_eq!(worker_count(4, 2), 2);
        assert_eq!(worker_count(0, 3), 1);
        assert_eq!(worker_count(8, 0), 1);
        assert_eq!(worker_count(usize::MAX, 3), 3);
        assert!(worker_count(usize::MAX, usize::MAX) <= Semaphore::MAX_PERMITS);
    }

    #[tokio::test]
    async fn test_unbounded_concurrency_setting_still_runs() {
        let reasoner = Arc::new(
            ScriptedReasoner::new()
                .with_default(Role::Search, Err("offline".into()))
                .with_refine_failure("offline"),
        );
        let table = orchestrator(reasoner, usize::MAX)
            .run(&items(&["Acme Corp", "Globex"]))
            .await;

        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|o| o.rounds_used == 2 && !o.validated));
    }

    #[tokio::test]
    async fn test_empty_input_gives_empty_table() {
        let reasoner = Arc::new(ScriptedReasoner::new());
        let table = orchestrator(reasoner.clone(), 4).run(&[]).await;
        assert!(table.is_empty());
        assert!(reasoner.calls().is_empty());
    }
}
