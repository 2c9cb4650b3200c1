//! Exhibitor-Harvest main entry point
//!
//! This is the command-line interface for the Exhibitor-Harvest directory crawler.

use anyhow::Context;
use clap::Parser;
use exhibitor_harvest::config::{load_config_with_hash, Config};
use exhibitor_harvest::crawler::{crawl, export_journal, spawn_cancel_triggers};
use exhibitor_harvest::output::{print_report, CrawlOutcome};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exhibitor-Harvest: an exhibitor directory crawler
///
/// Exhibitor-Harvest drives a WebDriver browser session through an exhibitor
/// directory, visits every listed company's detail page and exports the
/// collected contact details as a spreadsheet or CSV table.
#[derive(Parser, Debug)]
#[command(name = "exhibitor-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An exhibitor directory crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "export_journal")]
    dry_run: bool,

    /// Write the latest journal run to the output file and exit
    #[arg(long, conflicts_with = "dry_run")]
    export_journal: bool,

    /// Override the output path from the config
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.export_journal {
        handle_export_journal(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("exhibitor_harvest=info,warn"),
            1 => EnvFilter::new("exhibitor_harvest=debug,info"),
            2 => EnvFilter::new("exhibitor_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Exhibitor-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Start URL: {}", config.site.start_url);
    println!(
        "  Trailing controls: {} (the last {} index entries are skipped)",
        config.site.trailing_controls, config.site.trailing_controls
    );
    if !config.site.control_labels.is_empty() {
        println!("  Control labels: {:?}", config.site.control_labels);
    }

    println!("\nSelectors:");
    for (key, selector) in config.selectors.entries() {
        println!("  {}: {}", key, selector);
    }

    let timing = &config.timing;
    println!("\nTiming:");
    println!("  Settle delay: {}ms", timing.settle_delay);
    println!("  Return delay: {}ms", timing.return_delay);
    println!(
        "  Load more: {}ms settle, {}ms wait (backoff up to {}ms)",
        timing.load_more_settle, timing.load_delay, timing.max_backoff
    );
    println!("  Element timeout: {}ms", timing.element_timeout);
    match timing.max_duration() {
        Some(budget) => println!("  Time budget: {}s", budget.as_secs()),
        None => println!("  Time budget: unbounded"),
    }

    println!("\nRetry:");
    println!(
        "  Max expansion attempts: {}",
        config.retry.max_expansion_attempts
    );
    println!("  Navigation retries: {}", config.retry.navigation_retries);
    println!("  On failure: {:?}", config.retry.on_failure);

    println!("\nBrowser:");
    println!("  WebDriver: {}", config.browser.webdriver_url);
    println!("  Headless: {}", config.browser.headless);

    println!("\nOutput:");
    println!("  Table: {} ({:?})", config.output.path, config.output.format());
    println!("  Journal: {}", config.output.journal_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --export-journal mode: re-exports the latest journal run
fn handle_export_journal(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Journal ===\n");
    println!("Journal: {}", config.output.journal_path);
    println!("Output: {}", config.output.path);
    println!();

    let written = export_journal(config).context("Failed to export journal")?;

    println!("✓ {} record(s) exported to: {}", written, config.output.path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} via {}",
        config.site.start_url,
        config.browser.webdriver_url
    );

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&config, &cancel);

    let report = crawl(config, config_hash, cancel.clone())
        .await
        .context("Crawl failed")?;
    cancel.cancel();

    print_report(&report);

    match report.outcome {
        CrawlOutcome::Aborted(e) => Err(anyhow::Error::new(e).context("Crawl aborted")),
        CrawlOutcome::Completed | CrawlOutcome::Cancelled => Ok(()),
    }
}
