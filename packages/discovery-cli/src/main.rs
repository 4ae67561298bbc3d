//! Financial Source Discovery CLI
//!
//! Reads a table of companies, finds a validated source URL and reference
//! year for each, and writes the result table (plus an optional JSON report).
//!
//! ```text
//! discover --input companies.csv --output sources.csv --report run.json
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use discovery::{
    table, DiscoveryLoop, HttpProbe, OpenAiReasoner, Orchestrator, ProbeExt, ReasonerExt,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{delimiter_byte, FileConfig};

#[derive(Debug, Parser)]
#[command(
    name = "discover",
    about = "Find authoritative financial sources for a list of companies"
)]
struct Args {
    /// Input table (columns ID, NAME, VARIABLE; optional SOURCE_TYPE, REFYEAR)
    #[arg(short, long)]
    input: PathBuf,

    /// Output table, one row per input row
    #[arg(short, long)]
    output: PathBuf,

    /// Write a JSON report with every round of every item
    #[arg(long)]
    report: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Field delimiter for input and output tables
    #[arg(long)]
    delimiter: Option<char>,

    /// Maximum search-validate rounds per company
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Companies processed at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Time budget for each external call, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Chat model (overrides OPENAI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Website requests per second (0 disables the website probe)
    #[arg(long)]
    probe_rps: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,discovery=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    // Command-line flags override the file
    let mut discovery_config = file_config.discovery.clone();
    if let Some(rounds) = args.max_rounds {
        discovery_config = discovery_config.with_max_rounds(rounds);
    }
    if let Some(workers) = args.concurrency {
        discovery_config = discovery_config.with_max_concurrency(workers);
    }
    if let Some(secs) = args.timeout_secs {
        discovery_config = discovery_config.with_call_timeout(Duration::from_secs(secs));
    }
    if let Some(rps) = args.probe_rps {
        file_config.probe.enabled = rps > 0;
        file_config.probe.requests_per_second = rps;
    }
    discovery_config
        .validate()
        .context("Invalid discovery configuration")?;

    let delimiter = delimiter_byte(args.delimiter.unwrap_or(file_config.table.delimiter))?;

    let items = table::read_items(&args.input, delimiter)
        .with_context(|| format!("Failed to read input table {}", args.input.display()))?;

    // Reasoner
    let mut reasoner = OpenAiReasoner::from_env().context("OPENAI_API_KEY must be set")?;
    if let Some(model) = args.model.or(file_config.openai.model) {
        reasoner = reasoner.with_model(model);
    }
    tracing::info!(
        model = reasoner.model(),
        max_rounds = discovery_config.max_rounds,
        max_concurrency = discovery_config.max_concurrency,
        timeout_ms = discovery_config.call_timeout.as_millis() as u64,
        "Starting discovery"
    );
    let reasoner = reasoner.with_retry(discovery_config.retry);

    let mut discovery = DiscoveryLoop::new(Arc::new(reasoner), discovery_config.clone());

    // Website probe doubles as the link checker
    if file_config.probe.enabled {
        let probe = Arc::new(
            HttpProbe::new()
                .context("Failed to build HTTP client")?
                .with_retry(discovery_config.retry)
                .rate_limited(file_config.probe.requests_per_second)
                .context("Invalid probe rate")?,
        );
        discovery = discovery.with_probe(probe.clone()).with_link_checker(probe);
    }

    let results = Orchestrator::new(discovery).run(&items).await;

    table::write_results(&args.output, &results, delimiter)
        .with_context(|| format!("Failed to write output table {}", args.output.display()))?;

    if let Some(path) = &args.report {
        table::write_report(path, &results)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    let summary = results.summary();
    tracing::info!(
        run_id = %results.run_id,
        total = summary.total,
        validated = summary.validated,
        exhausted = summary.exhausted,
        failed = summary.failed,
        validation_rate = %format!("{:.1}%", summary.validation_rate() * 100.0),
        output = %args.output.display(),
        "Discovery complete"
    );

    Ok(())
}
