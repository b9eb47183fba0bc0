//! POSTD crawler main entry point
//!
//! This is the command-line interface for registering website sources,
//! crawling them, and inspecting what has been stored.

use anyhow::Context;
use clap::{Parser, Subcommand};
use postd_crawler::config::{load_config_or_default, Config};
use postd_crawler::crawler::{crawl_website, CrawlOptions};
use postd_crawler::output::{write_report, CrawlReport, PagesReport, SourcesReport};
use postd_crawler::sources::{create_or_get_website_source, get_source, list_sources_with_stats};
use postd_crawler::storage::{PageStore, Source, SqliteStorage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// POSTD crawler: website ingestion for brand analysis
///
/// Crawls a website within its own host, extracts clean text and metadata
/// from each page, and stores the results per workspace. Reports are printed
/// to stdout as JSON; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "postd-crawler")]
#[command(version)]
#[command(about = "Website crawler for brand analysis", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a website (or reuse its source) and crawl it
    Crawl {
        /// Workspace that owns the source
        #[arg(long)]
        workspace: Uuid,

        /// Website URL, e.g. `example.com` or `https://example.com/`
        url: String,

        /// Maximum number of pages to process
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Crawl an already registered source again
    Recrawl {
        /// Source to crawl
        #[arg(long)]
        source: Uuid,

        /// Maximum number of pages to process
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// List the sources of a workspace with page counts
    Sources {
        #[arg(long)]
        workspace: Uuid,
    },

    /// List the crawled pages of a workspace
    Pages {
        #[arg(long)]
        workspace: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = &cli.config {
        tracing::info!("Configuration loaded from: {}", path.display());
    }

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))?;

    match cli.command {
        Command::Crawl {
            workspace,
            url,
            max_pages,
        } => handle_crawl(&config, storage, workspace, &url, max_pages).await,
        Command::Recrawl { source, max_pages } => handle_recrawl(&config, storage, source, max_pages).await,
        Command::Sources { workspace } => handle_sources(&storage, workspace),
        Command::Pages { workspace } => handle_pages(&storage, workspace),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("postd_crawler=info,warn"),
            1 => EnvFilter::new("postd_crawler=debug,info"),
            2 => EnvFilter::new("postd_crawler=trace,debug"),
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

/// Handles `crawl`: create or reuse the source, then crawl it
async fn handle_crawl(
    config: &Config,
    mut storage: SqliteStorage,
    workspace_id: Uuid,
    url: &str,
    max_pages: Option<usize>,
) -> anyhow::Result<()> {
    let source = create_or_get_website_source(&mut storage, workspace_id, url)
        .with_context(|| format!("Failed to register website {}", url))?;

    run_and_report(config, storage, workspace_id, source, max_pages).await
}

/// Handles `recrawl`: crawl an existing source under its own workspace
async fn handle_recrawl(
    config: &Config,
    storage: SqliteStorage,
    source_id: Uuid,
    max_pages: Option<usize>,
) -> anyhow::Result<()> {
    let source = get_source(&storage, source_id)?;
    let workspace_id = source.workspace_id;

    run_and_report(config, storage, workspace_id, source, max_pages).await
}

async fn run_and_report(
    config: &Config,
    storage: SqliteStorage,
    workspace_id: Uuid,
    source: Source,
    max_pages: Option<usize>,
) -> anyhow::Result<()> {
    let store = Arc::new(Mutex::new(storage));
    let options = CrawlOptions { max_pages };

    let result = match crawl_website(config, store, workspace_id, &source, options).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    write_report(&mut std::io::stdout().lock(), &CrawlReport { source, result })?;
    Ok(())
}

/// Handles `sources`: print every source of a workspace with its stats
fn handle_sources(storage: &SqliteStorage, workspace_id: Uuid) -> anyhow::Result<()> {
    let sources = list_sources_with_stats(storage, workspace_id)?;
    write_report(&mut std::io::stdout().lock(), &SourcesReport { sources })?;
    Ok(())
}

/// Handles `pages`: print the crawled pages of a workspace
fn handle_pages(storage: &SqliteStorage, workspace_id: Uuid) -> anyhow::Result<()> {
    let pages = storage.list_pages(workspace_id)?;
    write_report(&mut std::io::stdout().lock(), &PagesReport::new(pages))?;
    Ok(())
}
