//! Page-Spider main entry point
//!
//! This is the command-line interface for the Page-Spider crawler.

use anyhow::Context;
use clap::Parser;
use page_spider::config::{load_config, validate, Config};
use page_spider::crawler::Coordinator;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status when at least one page could not be fetched
const EXIT_FETCH_FAILED: u8 = 2;

/// Page-Spider: crawls every page of a site reachable from a starting point
///
/// Links are followed if they start with the starting point (or match a
/// --whitelist pattern) and match no --blacklist pattern.
#[derive(Parser, Debug)]
#[command(name = "page-spider")]
#[command(version)]
#[command(about = "Crawls all pages of a site reachable from a starting point", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "STARTING_POINT", required_unless_present = "config")]
    starting_point: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Follow only links matching this regex (repeatable; replaces the default)
    #[arg(short, long, value_name = "REGEX")]
    whitelist: Vec<String>,

    /// Never follow links matching this regex (repeatable)
    #[arg(short, long, value_name = "REGEX")]
    blacklist: Vec<String>,

    /// Report every crawl decision, with full error details
    #[arg(long)]
    tracing: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.tracing);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match handle_crawl(config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FETCH_FAILED),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, tracing: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose.max(u8::from(tracing)) {
            0 => EnvFilter::new("page_spider=info,warn"),
            1 => EnvFilter::new("page_spider=debug,info"),
            2 => EnvFilter::new("page_spider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Merges the config file (if any) with command-line flags
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::new(cli.starting_point.clone().unwrap_or_default()),
    };

    if let Some(starting_point) = &cli.starting_point {
        config.starting_point = starting_point.clone();
    }
    if !cli.whitelist.is_empty() {
        config.whitelist = Some(cli.whitelist.clone());
    }
    config.blacklist.extend(cli.blacklist.iter().cloned());
    config.tracing |= cli.tracing;

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Runs the crawl, printing each visited page
async fn handle_crawl(config: Config) -> anyhow::Result<bool> {
    tracing::info!("Starting crawl at {}", config.starting_point);

    let mut coordinator = Coordinator::new(config)?;

    let success = coordinator
        .start(|page| {
            match page.title() {
                Some(title) => println!("{}\t{}", page.url, title),
                None => println!("{}", page.url),
            }
            Ok(())
        })
        .await;

    tracing::info!(
        "Crawl finished: {} pages visited, {} failed",
        coordinator.done().len(),
        coordinator.failures().len()
    );

    for failure in coordinator.failures() {
        tracing::error!("{}: {}", failure.url, failure.error);
    }

    Ok(success)
}
