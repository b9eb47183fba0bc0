//! Output module for reporting crawl results
//!
//! This module handles:
//! - The JSON shapes printed by the command line (crawl, sources, pages)
//! - Writing a report to any `io::Write`

use crate::crawler::{CrawlResult, PageMetadata};
use crate::sources::SourceSummary;
use crate::storage::{CrawledPage, Source};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

/// Result of creating (or reusing) a source and crawling it
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub source: Source,
    pub result: CrawlResult,
}

/// Sources of a workspace with their crawl statistics
#[derive(Debug, Clone, Serialize)]
pub struct SourcesReport {
    pub sources: Vec<SourceSummary>,
}

/// Crawled pages of a workspace, most recent first
#[derive(Debug, Clone, Serialize)]
pub struct PagesReport {
    pub pages: Vec<PageListing>,
}

/// A crawled page without its text and raw HTML
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageListing {
    pub id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub metadata: PageMetadata,
    pub crawled_at: DateTime<Utc>,
}

impl From<CrawledPage> for PageListing {
    fn from(page: CrawledPage) -> Self {
        Self {
            id: page.id,
            url: page.url,
            title: page.title,
            metadata: page.metadata,
            crawled_at: page.crawled_at,
        }
    }
}

impl PagesReport {
    pub fn new(pages: Vec<CrawledPage>) -> Self {
        Self {
            pages: pages.into_iter().map(PageListing::from).collect(),
        }
    }
}

/// Writes a report as pretty-printed JSON followed by a newline
pub fn write_report<W: Write, T: Serialize>(writer: &mut W, report: &T) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)
}
