//! Synthetic traffic generator CLI
//!
//! Loads a URL list, launches the browser engine, and runs the concurrent
//! session manager until the queue is drained, then persists the dataset.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use trafficgen::browser::BrowserDriver;
use trafficgen::config::{self, Config};
use trafficgen::stats::RunStats;
use trafficgen::storage::{expand_sessions, load_urls_from_file, DatasetWriter, UrlQueue};
use trafficgen::traffic::{ActionSimulator, SessionManager};

#[derive(Parser, Debug)]
#[command(
    name = "trafficgen",
    about = "Synthetic web traffic generator driving randomized browser sessions"
)]
struct Cli {
    /// Path to file containing URLs, one per line
    #[arg(long, default_value = config::DEFAULT_URLS_FILE)]
    urls_file: PathBuf,

    /// Path to JSON file where results will be stored
    #[arg(long, default_value = config::DEFAULT_OUTPUT_FILE)]
    output_file: PathBuf,

    /// Number of sessions (each session iterates over the URL list)
    #[arg(long, default_value_t = 1)]
    sessions: u32,

    /// Maximum automated interactions per URL
    #[arg(long, default_value_t = 10)]
    max_interactions: u32,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 3)]
    concurrency: usize,

    /// Run browsers in headless mode (default: true)
    #[arg(long, default_value_t = true)]
    headless: bool,

    /// Disable headless mode
    #[arg(long)]
    no_headless: bool,

    /// Delay in seconds between processing URLs per worker
    #[arg(long, default_value_t = 0.0)]
    delay_between_sessions: f64,
}

impl Cli {
    fn into_config(self) -> Config {
        let headless = if self.no_headless { false } else { self.headless };
        Config {
            urls_file: self.urls_file,
            output_file: self.output_file,
            sessions: self.sessions,
            max_interactions: self.max_interactions,
            concurrency: self.concurrency,
            headless,
            delay_between_sessions: self.delay_between_sessions,
        }
    }
}

#[tokio::main]
async fn main() {
    let _guard = trafficgen::init_logging();

    let config = Cli::parse().into_config();

    if let Err(e) = run_simulation(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run_simulation(config: Config) -> anyhow::Result<()> {
    config::validate_config(&config, Path::new(config::DEFAULT_SCHEMA_FILE))?;

    let urls = load_urls_from_file(&config.urls_file)
        .with_context(|| format!("Failed to read URLs from {}", config.urls_file.display()))?;
    if urls.is_empty() {
        anyhow::bail!("No URLs loaded from {}", config.urls_file.display());
    }

    let base_count = urls.len();
    let urls = expand_sessions(&urls, config.sessions);
    if config.sessions > 1 {
        info!(
            "Running {} sessions across {} base URLs ({} total visits).",
            config.sessions,
            base_count,
            urls.len()
        );
    } else {
        info!("Running a single session across {} URLs.", urls.len());
    }

    let queue = Arc::new(UrlQueue::new(urls));
    let writer = Arc::new(DatasetWriter::new(config.output_file.clone()));
    let stats = Arc::new(RunStats::new());

    let driver = Arc::new(BrowserDriver::new(config.headless));
    driver.start().await?;

    let manager = SessionManager::new(
        driver.clone(),
        Arc::new(ActionSimulator::new()),
        queue,
        writer.clone(),
        stats.clone(),
        config.max_interactions,
        config.concurrency,
        Duration::from_secs_f64(config.delay_between_sessions.max(0.0)),
    );
    manager.run().await;

    // Engine goes down before results are persisted; run() absorbs all
    // per-URL failures so nothing else can abort between start and stop.
    driver.stop().await;

    writer.flush().with_context(|| {
        format!(
            "Failed to write dataset to {}",
            config.output_file.display()
        )
    })?;

    let summary = stats.snapshot();
    info!(
        "Run summary: {} visits completed, {} URLs dropped, {} navigation failures, {} interactions in {:.1}s",
        summary.visits_completed,
        summary.urls_dropped,
        summary.navigation_failures,
        summary.interactions_total,
        summary.elapsed_secs
    );
    info!(
        "Simulation complete. Results written to {}",
        config.output_file.display()
    );
    Ok(())
}
