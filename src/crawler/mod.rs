//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a bounded timeout
//! - Content extraction and same-host link discovery
//! - The breadth-first frontier
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{crawl_website, Coordinator, CrawlOptions, CrawlResult, PageOutcome};
pub use extractor::{extract_content, ExtractedContent, PageMetadata};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use frontier::Frontier;
pub use parser::extract_internal_links;
