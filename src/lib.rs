//! POSTD crawler: website ingestion for brand analysis
//!
//! This crate crawls a website breadth-first within its own host, extracts
//! clean text and metadata from every page, and stores the results per
//! workspace and source.

pub mod config;
pub mod crawler;
pub mod output;
pub mod sources;
pub mod storage;
pub mod url;

use thiserror::Error;
use uuid::Uuid;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum PostdError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Source not found: {0}")]
    SourceNotFound(Uuid),

    #[error("Source {0} is not a website source")]
    NotWebsiteSource(Uuid),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_website, CrawlOptions, CrawlResult};
pub use url::normalize_url;
