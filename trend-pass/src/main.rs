//! trend-pass - run one trend discovery and publication pass
//!
//! Fetches the trending charts, posts what qualifies, prints a JSON report to
//! stdout and exits. Scheduling is left to cron or a systemd timer.

use anyhow::Context;
use clap::Parser;
use libtrendcast::{Config, PassReport, TrendPass};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "trend-pass")]
#[command(version)]
#[command(about = "Run one trend discovery and publication pass")]
#[command(long_about = "\
trend-pass - run one trend discovery and publication pass

DESCRIPTION:
    Fetches the YouTube trending charts for Turkey and the United States,
    selects videos that are new or gained more than the configured number of
    views since the previous pass, and posts up to three of them per region
    to X. Posts that were already published are never sent again.

    A single invocation runs one pass and exits. Do not run two passes at
    the same time: the state files are not locked.

CONFIGURATION:
    Configuration file: $TRENDCAST_CONFIG or ~/.config/trendcast/config.toml
    Credentials:        YOUTUBE_API_KEY, TWITTER_BEARER_TOKEN
    Logging:            TRENDCAST_LOG_FORMAT (text|json|pretty),
                        TRENDCAST_LOG_LEVEL (error|warn|info|debug|trace)

EXIT CODES:
    0 - Pass completed
    1 - Pass aborted (trend source or state file error)
    2 - Configuration error
")]
struct Cli {}

#[tokio::main]
async fn main() {
    let _cli = Cli::parse();

    libtrendcast::logging::init_default();

    match run().await {
        Ok(report) => {
            if let Err(e) = print_report(&report) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run() -> libtrendcast::Result<PassReport> {
    let config = Config::load()?;
    info!(
        "Starting pass (baseline: {}, ledger: {})",
        config.baseline_path().display(),
        config.ledger_path().display()
    );

    TrendPass::from_config(&config)?.run().await
}

fn print_report(report: &PassReport) -> anyhow::Result<()> {
    let json = serde_json::to_string(report).context("Failed to serialize pass report")?;
    println!("{}", json);
    Ok(())
}
