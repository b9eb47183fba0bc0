//! Storage traits and error types
//!
//! The crawl engine only sees these two traits. `SqliteStorage` implements both;
//! tests substitute their own implementations to simulate store outages.

use crate::crawler::ExtractedContent;
use crate::storage::{CrawledPage, Source};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence of crawled pages
pub trait PageStore {
    /// Inserts or updates the page identified by (workspace, source, url)
    ///
    /// An existing row keeps its id and has its title, text, raw HTML, metadata
    /// and crawl timestamp replaced. Otherwise a new row with a fresh id is
    /// inserted.
    ///
    /// # Returns
    ///
    /// The id of the written page
    fn upsert_page(
        &mut self,
        workspace_id: Uuid,
        source_id: Uuid,
        url: &str,
        content: &ExtractedContent,
        raw_html: &str,
    ) -> StorageResult<Uuid>;

    /// Gets a page by its exact (workspace, source, url) triple
    fn get_page(
        &self,
        workspace_id: Uuid,
        source_id: Uuid,
        url: &str,
    ) -> StorageResult<Option<CrawledPage>>;

    /// Lists every page in a workspace, most recently crawled first
    fn list_pages(&self, workspace_id: Uuid) -> StorageResult<Vec<CrawledPage>>;

    /// Counts the pages stored for a source
    fn count_pages(&self, source_id: Uuid) -> StorageResult<u64>;

    /// Gets the most recent crawl timestamp for a source
    fn latest_crawl(&self, source_id: Uuid) -> StorageResult<Option<DateTime<Utc>>>;
}

/// Registry of crawl sources
pub trait SourceRegistry {
    /// Returns the website source for `normalized_url`, creating it if needed
    ///
    /// The URL must already be normalized; two calls with the same
    /// (workspace, url) return the same record.
    fn create_or_get_website_source(
        &mut self,
        workspace_id: Uuid,
        normalized_url: &str,
    ) -> StorageResult<Source>;

    /// Gets a source by ID
    fn get_source(&self, source_id: Uuid) -> StorageResult<Option<Source>>;

    /// Lists the sources of a workspace, newest first
    fn list_sources(&self, workspace_id: Uuid) -> StorageResult<Vec<Source>>;
}
