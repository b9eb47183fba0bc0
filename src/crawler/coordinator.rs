//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives one website crawl:
//! - Seeding the frontier with the source's root URL
//! - Fetching, extracting and persisting each page in turn
//! - Following same-host links breadth-first until the page budget is spent

use crate::config::{Config, CrawlerConfig, StoreFailurePolicy};
use crate::crawler::extractor::{extract_content, ExtractedContent};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_internal_links;
use crate::crawler::{build_http_client, fetch_url};
use crate::storage::{PageStore, Source, StorageError, StorageResult};
use crate::PostdError;
use reqwest::Client;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Per-call crawl options
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlOptions {
    /// Page budget; falls back to `[crawler] max-pages` when None
    pub max_pages: Option<usize>,
}

/// Summary of a finished crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    /// URLs dequeued and processed, whether or not their fetch succeeded
    pub pages_crawled: usize,
}

/// What happened to one processed URL
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub url: String,

    /// Id of the stored page; None when the fetch failed or the store was skipped
    pub page_id: Option<Uuid>,

    /// Same-host links discovered on the page
    pub links: Vec<String>,
}

/// Main crawler coordinator structure
///
/// A coordinator holds no per-crawl state; every crawl owns its own
/// `Frontier`, so one coordinator can run any number of crawls.
pub struct Coordinator<S> {
    store: Arc<Mutex<S>>,
    client: Client,
    crawler: CrawlerConfig,
}

impl<S: PageStore> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `store` - Shared page store the crawl writes into
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(PostdError)` - The HTTP client could not be built
    pub fn new(config: &Config, store: Arc<Mutex<S>>) -> Result<Self, PostdError> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        Ok(Self::with_client(client, config.crawler.clone(), store))
    }

    /// Creates a coordinator around an existing HTTP client
    pub fn with_client(client: Client, crawler: CrawlerConfig, store: Arc<Mutex<S>>) -> Self {
        Self {
            store,
            client,
            crawler,
        }
    }

    /// Crawls a website source breadth-first
    ///
    /// The crawl ends when the frontier runs dry or `max_pages` URLs have been
    /// processed. Fetch failures count against the budget but never end the
    /// crawl; store failures follow the configured `StoreFailurePolicy`.
    ///
    /// # Arguments
    ///
    /// * `workspace_id` - Workspace the pages are written under
    /// * `source` - The website source to crawl
    /// * `options` - Per-call options (page budget)
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - Number of pages processed
    /// * `Err(PostdError)` - The source is not a website, or a store write failed
    ///   under the `abort` policy
    pub async fn crawl(
        &self,
        workspace_id: Uuid,
        source: &Source,
        options: CrawlOptions,
    ) -> Result<CrawlResult, PostdError> {
        let website = source
            .website_config()
            .ok_or(PostdError::NotWebsiteSource(source.id))?;
        let max_pages = options.max_pages.unwrap_or(self.crawler.max_pages);

        tracing::info!("Starting crawl of {} (max {} pages)", website.url, max_pages);

        let mut frontier = Frontier::new(&website.url);
        let mut pages_crawled = 0;

        while pages_crawled < max_pages {
            let Some(url) = frontier.next_url() else {
                tracing::debug!("Frontier is empty");
                break;
            };

            tracing::info!("Crawling page {}/{}: {}", pages_crawled + 1, max_pages, url);

            let outcome = self.process_url(workspace_id, source.id, &url).await?;
            pages_crawled += 1;

            if let Some(page_id) = outcome.page_id {
                tracing::debug!("Stored {} as page {}", outcome.url, page_id);
            }

            let added = frontier.add_to_frontier(outcome.links);
            tracing::debug!(
                "{} new links from {}, {} in frontier",
                added,
                url,
                frontier.frontier_size()
            );
        }

        tracing::info!("Crawl complete. Crawled {} pages.", pages_crawled);
        tracing::debug!(
            "{} URLs visited, {} left in frontier",
            frontier.visited_count(),
            frontier.frontier_size()
        );

        Ok(CrawlResult { pages_crawled })
    }

    /// Processes a single URL
    ///
    /// This method:
    /// 1. Fetches the page
    /// 2. Extracts title, text and metadata
    /// 3. Persists the page
    /// 4. Extracts same-host links
    ///
    /// A failed fetch yields an outcome with no page and no links.
    pub async fn process_url(
        &self,
        workspace_id: Uuid,
        source_id: Uuid,
        url: &str,
    ) -> Result<PageOutcome, PostdError> {
        let Some(body) = fetch_url(&self.client, url).await.into_body() else {
            return Ok(PageOutcome {
                url: url.to_string(),
                page_id: None,
                links: Vec::new(),
            });
        };

        let content = extract_content(&body, url);

        let page_id = match self.store_page(workspace_id, source_id, url, &content, &body) {
            Ok(id) => Some(id),
            Err(e) => match self.crawler.on_store_error {
                StoreFailurePolicy::Abort => return Err(e.into()),
                StoreFailurePolicy::Skip => {
                    tracing::error!("Failed to store {}: {}", url, e);
                    None
                }
            },
        };

        let links = extract_internal_links(&body, url);

        Ok(PageOutcome {
            url: url.to_string(),
            page_id,
            links,
        })
    }

    fn store_page(
        &self,
        workspace_id: Uuid,
        source_id: Uuid,
        url: &str,
        content: &ExtractedContent,
        raw_html: &str,
    ) -> StorageResult<Uuid> {
        let mut store = self.store.lock().map_err(|_| StorageError::LockPoisoned)?;
        store.upsert_page(workspace_id, source_id, url, content, raw_html)
    }
}

/// Runs one crawl of a website source
///
/// Builds a coordinator from `config` and crawls `source` with it.
///
/// # Example
///
/// ```no_run
/// use postd_crawler::config::Config;
/// use postd_crawler::crawler::{crawl_website, CrawlOptions};
/// use postd_crawler::sources::create_or_get_website_source;
/// use postd_crawler::storage::SqliteStorage;
/// use std::sync::{Arc, Mutex};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut storage = SqliteStorage::new_in_memory()?;
/// let workspace_id = Uuid::new_v4();
/// let source = create_or_get_website_source(&mut storage, workspace_id, "example.com")?;
///
/// let store = Arc::new(Mutex::new(storage));
/// let result = crawl_website(&Config::default(), store, workspace_id, &source, CrawlOptions::default()).await?;
/// println!("{} pages", result.pages_crawled);
/// # Ok(())
/// # }
/// ```
pub async fn crawl_website<S: PageStore>(
    config: &Config,
    store: Arc<Mutex<S>>,
    workspace_id: Uuid,
    source: &Source,
    options: CrawlOptions,
) -> Result<CrawlResult, PostdError> {
    let coordinator = Coordinator::new(config, store)?;
    coordinator.crawl(workspace_id, source, options).await
}
