//! Blocked-Domains main entry point
//!
//! This is the command-line interface for the blocked-domain list harvester.

use anyhow::Context;
use blocked_domains::config::{load_config_with_hash, Config};
use blocked_domains::crawler::{run_crawl, CrawlTarget};
use blocked_domains::dedupe::dedupe_with_report;
use blocked_domains::output::print_summary;
use blocked_domains::BlockedError;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Blocked-Domains: a blocked-domain list harvester
///
/// Crawls a paginated listing of censorship test results, keeps the entries
/// blocked at or above the configured percentage, and writes a minimal sorted
/// domain list (subdomains of listed domains removed) plus an IP list.
#[derive(Parser, Debug)]
#[command(name = "blocked-domains")]
#[command(version = "1.0.0")]
#[command(about = "Harvests a minimal list of blocked domains", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "dedupe")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without any network access
    #[arg(long, conflicts_with = "dedupe")]
    dry_run: bool,

    /// Remove redundant subdomains from a newline-delimited domain file and print the result
    #[arg(long, value_name = "FILE")]
    dedupe: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(path) = &cli.dedupe {
        return match handle_dedupe(path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    let Some(config_path) = cli.config else {
        tracing::error!("No configuration file given");
        return ExitCode::from(2);
    };

    match run(&config_path, cli.dry_run).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(config_path: &Path, dry_run: bool) -> Result<(), BlockedError> {
    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", config_path.display());
    let (config, config_hash) = load_config_with_hash(config_path)?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if dry_run {
        handle_dry_run(&config);
        Ok(())
    } else {
        handle_crawl(config, config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("blocked_domains=info,warn"),
            1 => EnvFilter::new("blocked_domains=debug,info"),
            2 => EnvFilter::new("blocked_domains=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Blocked-Domains Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Concurrency: {} (configured: {})",
        config.crawler.effective_concurrency(),
        config
            .crawler
            .concurrency
            .map_or_else(|| "auto".to_string(), |n| n.to_string())
    );
    println!("  Attempts per page: {}", config.crawler.max_retries);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    println!("  Record buffer: {}", config.crawler.channel_capacity);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nFilter:");
    println!("  Minimum blocked percentage: {}%", config.filter.percent);
    println!("  Domain pattern: {}", config.filter.domain_regex);
    match config.filter.domain_group {
        Some(group) => println!("  Domain group: {}", group),
        None => println!("  Domain group: second-to-last"),
    }
    println!("  IP pattern: {}", config.filter.ip_regex);

    let dir = Path::new(&config.output.dir);
    println!("\nOutput:");
    println!("  Raw records: {}", dir.join(&config.output.raw_file).display());
    println!("  Domains: {}", dir.join(&config.output.domain_file).display());
    println!("  IPs: {}", dir.join(&config.output.ip_file).display());

    let targets = CrawlTarget::from_config(config);
    println!("\nTargets ({}):", targets.len());
    for target in &targets {
        let range = match target.to {
            Some(to) => format!("{}..={}", target.from, to),
            None => format!("{}..=last", target.from),
        };
        let probe = target
            .probe_url()
            .unwrap_or_else(|e| format!("<invalid: {}>", e));

        if target.enabled {
            println!("  - {} pages {} (probe {})", target.name, range, probe);
        } else {
            println!("  - {} (disabled)", target.name);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would probe {} enabled targets",
        targets.iter().filter(|t| t.enabled).count()
    );
}

/// Handles the --dedupe mode: offline redundancy removal
fn handle_dedupe(path: &Path) -> anyhow::Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read domain list {}", path.display()))?;

    let domains: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let report = dedupe_with_report(&domains);
    tracing::info!(
        "Kept {} of {} domains ({} redundant, {} rejected)",
        report.kept.len(),
        domains.len(),
        report.redundant.len(),
        report.rejected.len()
    );

    for domain in &report.kept {
        println!("{}", domain);
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> Result<(), BlockedError> {
    let enabled = config.targets.iter().filter(|t| t.enabled).count();
    tracing::info!(
        "Targets: {} enabled of {}, threshold {}%",
        enabled,
        config.targets.len(),
        config.filter.percent
    );

    // Run the crawler
    let summary = run_crawl(config, Some(config_hash)).await?;
    tracing::info!("Crawl completed successfully");
    print_summary(&summary);

    Ok(())
}
