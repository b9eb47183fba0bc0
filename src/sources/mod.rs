//! Source registration and lookup
//!
//! Raw user input is normalized here before it reaches the registry, so a
//! workspace never holds two website sources for the same site.

use crate::storage::{PageStore, Source, SourceRegistry, SourceType};
use crate::url::normalize_url;
use crate::PostdError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A source together with its crawl statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    #[serde(flatten)]
    pub source: Source,

    /// Number of pages stored for the source
    pub pages_count: u64,

    /// Most recent `crawled_at` among its pages
    pub latest_crawl: Option<DateTime<Utc>>,
}

/// Creates a website source for a workspace, or returns the existing one
///
/// # Arguments
///
/// * `registry` - The source registry
/// * `workspace_id` - Owning workspace
/// * `raw_url` - URL as entered by the user (`example.com`, `https://example.com/` ...)
///
/// # Returns
///
/// * `Ok(Source)` - The new or already registered source
/// * `Err(PostdError::Url)` - The URL is empty or has no host
pub fn create_or_get_website_source<R: SourceRegistry>(
    registry: &mut R,
    workspace_id: Uuid,
    raw_url: &str,
) -> Result<Source, PostdError> {
    let normalized = normalize_url(raw_url)?;
    let source = registry.create_or_get_website_source(workspace_id, &normalized)?;

    tracing::debug!("Website source {} for {}", source.id, normalized);

    Ok(source)
}

/// Gets a source by ID, failing if it does not exist
pub fn get_source<R: SourceRegistry>(registry: &R, source_id: Uuid) -> Result<Source, PostdError> {
    registry
        .get_source(source_id)?
        .ok_or(PostdError::SourceNotFound(source_id))
}

/// Lists the website sources of a workspace, newest first
pub fn list_website_sources<R: SourceRegistry>(
    registry: &R,
    workspace_id: Uuid,
) -> Result<Vec<Source>, PostdError> {
    let sources = registry.list_sources(workspace_id)?;

    Ok(sources
        .into_iter()
        .filter(|source| source.source_type == SourceType::Website)
        .collect())
}

/// Lists every source of a workspace with its page count and latest crawl time
pub fn list_sources_with_stats<S>(store: &S, workspace_id: Uuid) -> Result<Vec<SourceSummary>, PostdError>
where
    S: SourceRegistry + PageStore,
{
    store
        .list_sources(workspace_id)?
        .into_iter()
        .map(|source| -> Result<SourceSummary, PostdError> {
            let pages_count = store.count_pages(source.id)?;
            let latest_crawl = store.latest_crawl(source.id)?;
            Ok(SourceSummary {
                source,
                pages_count,
                latest_crawl,
            })
        })
        .collect()
}
