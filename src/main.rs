//! Page-Harvest main entry point
//!
//! This is the command-line interface for the Page-Harvest site crawler.

use clap::Parser;
use page_harvest::config::{load_config_or_default, Config};
use page_harvest::crawler::{crawl, load_seed_urls, run_seed_extraction, RunOptions};
use page_harvest::output::{load_statistics, print_statistics, print_summary};
use page_harvest::storage::JsonCheckpointStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Page-Harvest: a resumable single-site content crawler
///
/// Page-Harvest renders every page of one site, extracts its structured
/// content into one JSON record per page, and checkpoints its progress so an
/// interrupted crawl picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version)]
#[command(about = "A resumable single-site content crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if it does not exist)
    #[arg(value_name = "CONFIG", default_value = "harvest.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, ignoring the saved checkpoint
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "extract_seeds"])]
    dry_run: bool,

    /// Show statistics from the saved checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "extract_seeds"])]
    stats: bool,

    /// Build the seed list from the site's navigation tree and exit
    #[arg(long, conflicts_with = "fresh")]
    extract_seeds: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, config_hash) = load_config_or_default(&cli.config)?;
    match &config_hash {
        Some(hash) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            cli.config.display(),
            hash
        ),
        None => tracing::info!(
            "No configuration at {}, using built-in defaults",
            cli.config.display()
        ),
    }

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.extract_seeds {
        handle_extract_seeds(&config).await
    } else {
        handle_crawl(
            config,
            RunOptions {
                fresh: cli.fresh,
                config_hash,
            },
        )
        .await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration and seeds
fn handle_dry_run(config: &Config) {
    println!("=== Page-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!(
        "  Seed list: {}",
        config.site.seed_list.as_deref().unwrap_or("-")
    );

    println!("\nCrawler:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Checkpoint interval: {}", config.crawler.checkpoint_interval);
    println!(
        "  Navigation timeout: {}ms",
        config.crawler.navigation_timeout
    );
    println!(
        "  Root selector: {} ({})",
        config.crawler.root_selector,
        if config.crawler.require_root {
            "required"
        } else {
            "best effort"
        }
    );
    println!(
        "  Delay between pages: {}-{}ms",
        config.rate_limit.min_delay, config.rate_limit.max_delay
    );

    println!("\nPatterns:");
    for pattern in &config.patterns.include {
        println!("  + {}", pattern);
    }
    for pattern in &config.patterns.exclude {
        println!("  - {}", pattern);
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Captures: {}", config.output.capture_dir);
    println!("  Checkpoint: {}", config.output.checkpoint_path);

    let seeds = load_seed_urls(&config.site);
    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds.iter().take(20) {
        println!("  * {}", seed);
    }
    if seeds.len() > 20 {
        println!("  ... and {} more", seeds.len() - 20);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the saved checkpoint
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Checkpoint: {}\n", config.output.checkpoint_path);

    let store = JsonCheckpointStore::new(&config.output.checkpoint_path)
        .with_capture_dir(&config.output.capture_dir);

    match load_statistics(&store)? {
        Some(snapshot) => print_statistics(&snapshot),
        None => println!("No crawl state found."),
    }

    Ok(())
}

/// Handles the --extract-seeds mode: walks the navigation tree and saves the seed list
async fn handle_extract_seeds(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Extracting seed URLs from {} start pages (at most {} requests)",
        config.seed_extract.start_paths.len(),
        config.seed_extract.max_requests
    );

    let (path, list) = run_seed_extraction(config).await?;
    println!("Saved {} URLs to {}", list.total, path.display());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, options: RunOptions) -> anyhow::Result<()> {
    if options.fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume from checkpoint if present)");
    }

    let report = crawl(config, options).await?;
    tracing::info!("Crawl finished: {}", report.stop_reason);
    print_summary(&report);

    Ok(())
}
