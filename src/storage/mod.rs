//! Storage module for persisting crawl data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Source registration, de-duplicated by (workspace, normalized url)
//! - Page upserts keyed by (workspace, source, url)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{PageStore, SourceRegistry, StorageError, StorageResult};

use crate::crawler::PageMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of origin a source points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Website,
    Instagram,
    Tiktok,
    Linkedin,
}

impl SourceType {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Linkedin => "linkedin",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "website" => Some(Self::Website),
            "instagram" => Some(Self::Instagram),
            "tiktok" => Some(Self::Tiktok),
            "linkedin" => Some(Self::Linkedin),
            _ => None,
        }
    }
}

/// Configuration of a website source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteSourceConfig {
    /// Normalized root URL
    pub url: String,
}

/// A registered crawl target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub workspace_id: Uuid,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Type-specific configuration, `{"url": ...}` for websites
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Source {
    /// Returns the website configuration, or None for other source types
    pub fn website_config(&self) -> Option<WebsiteSourceConfig> {
        if self.source_type != SourceType::Website {
            return None;
        }
        serde_json::from_value(self.config.clone()).ok()
    }
}

/// One fetched and extracted page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawledPage {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub source_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub content_text: String,
    pub raw_html: String,
    pub metadata: PageMetadata,
    pub crawled_at: DateTime<Utc>,
}
