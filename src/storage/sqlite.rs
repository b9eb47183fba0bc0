//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::crawler::ExtractedContent;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageStore, SourceRegistry, StorageError, StorageResult};
use crate::storage::{CrawledPage, Source, SourceType, WebsiteSourceConfig};
use crate::PostdError;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::de::DeserializeOwned;
use std::path::Path;
use uuid::Uuid;

const SOURCE_COLUMNS: &str = "id, workspace_id, type, config, created_at, updated_at";

const PAGE_COLUMNS: &str =
    "id, workspace_id, source_id, url, title, content_text, raw_html, metadata, crawled_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(PostdError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, PostdError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, PostdError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Current time at the precision stored in the database
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_db_time(&raw).map_err(|e| conversion_error(idx, e))
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn parse_db_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc))
}

fn source_from_row(row: &Row<'_>) -> rusqlite::Result<Source> {
    let type_str: String = row.get(2)?;
    let source_type = SourceType::from_db_string(&type_str).ok_or_else(|| {
        conversion_error(
            2,
            StorageError::Serialization(format!("Unknown source type '{}'", type_str)),
        )
    })?;

    Ok(Source {
        id: uuid_column(row, 0)?,
        workspace_id: uuid_column(row, 1)?,
        source_type,
        config: json_column(row, 3)?,
        created_at: time_column(row, 4)?,
        updated_at: time_column(row, 5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<CrawledPage> {
    Ok(CrawledPage {
        id: uuid_column(row, 0)?,
        workspace_id: uuid_column(row, 1)?,
        source_id: uuid_column(row, 2)?,
        url: row.get(3)?,
        title: row.get(4)?,
        content_text: row.get(5)?,
        raw_html: row.get(6)?,
        metadata: json_column(row, 7)?,
        crawled_at: time_column(row, 8)?,
    })
}

impl PageStore for SqliteStorage {
    fn upsert_page(
        &mut self,
        workspace_id: Uuid,
        source_id: Uuid,
        url: &str,
        content: &ExtractedContent,
        raw_html: &str,
    ) -> StorageResult<Uuid> {
        let metadata = serde_json::to_string(&content.metadata)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let crawled_at = to_db_time(&now());

        // Immediate so the lookup and the write happen under one write lock
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM crawled_pages WHERE workspace_id = ?1 AND source_id = ?2 AND url = ?3",
                params![workspace_id.to_string(), source_id.to_string(), url],
                |row| row.get(0),
            )
            .optional()?;

        let page_id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE crawled_pages SET title = ?1, content_text = ?2, raw_html = ?3,
                     metadata = ?4, crawled_at = ?5 WHERE id = ?6",
                    params![
                        content.title,
                        content.content_text,
                        raw_html,
                        metadata,
                        crawled_at,
                        id
                    ],
                )?;
                Uuid::parse_str(&id).map_err(|e| StorageError::Serialization(e.to_string()))?
            }
            None => {
                let id = Uuid::new_v4();
                tx.execute(
                    "INSERT INTO crawled_pages
                     (id, workspace_id, source_id, url, title, content_text, raw_html, metadata, crawled_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        id.to_string(),
                        workspace_id.to_string(),
                        source_id.to_string(),
                        url,
                        content.title,
                        content.content_text,
                        raw_html,
                        metadata,
                        crawled_at
                    ],
                )?;
                id
            }
        };

        tx.commit()?;
        Ok(page_id)
    }

    fn get_page(
        &self,
        workspace_id: Uuid,
        source_id: Uuid,
        url: &str,
    ) -> StorageResult<Option<CrawledPage>> {
        let sql = format!(
            "SELECT {} FROM crawled_pages WHERE workspace_id = ?1 AND source_id = ?2 AND url = ?3",
            PAGE_COLUMNS
        );

        let page = self
            .conn
            .query_row(
                &sql,
                params![workspace_id.to_string(), source_id.to_string(), url],
                page_from_row,
            )
            .optional()?;

        Ok(page)
    }

    fn list_pages(&self, workspace_id: Uuid) -> StorageResult<Vec<CrawledPage>> {
        let sql = format!(
            "SELECT {} FROM crawled_pages WHERE workspace_id = ?1 ORDER BY crawled_at DESC",
            PAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let pages = stmt
            .query_map(params![workspace_id.to_string()], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn count_pages(&self, source_id: Uuid) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawled_pages WHERE source_id = ?1",
            params![source_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn latest_crawl(&self, source_id: Uuid) -> StorageResult<Option<DateTime<Utc>>> {
        let latest: Option<String> = self.conn.query_row(
            "SELECT MAX(crawled_at) FROM crawled_pages WHERE source_id = ?1",
            params![source_id.to_string()],
            |row| row.get(0),
        )?;

        latest
            .map(|raw| parse_db_time(&raw).map_err(|e| StorageError::Serialization(e.to_string())))
            .transpose()
    }
}

impl SourceRegistry for SqliteStorage {
    fn create_or_get_website_source(
        &mut self,
        workspace_id: Uuid,
        normalized_url: &str,
    ) -> StorageResult<Source> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let sql = format!(
            "SELECT {} FROM sources
             WHERE workspace_id = ?1 AND type = ?2 AND json_extract(config, '$.url') = ?3",
            SOURCE_COLUMNS
        );
        let existing = tx
            .query_row(
                &sql,
                params![
                    workspace_id.to_string(),
                    SourceType::Website.to_db_string(),
                    normalized_url
                ],
                source_from_row,
            )
            .optional()?;

        if let Some(source) = existing {
            tracing::debug!("Website source {} already registered", normalized_url);
            return Ok(source);
        }

        let config = serde_json::to_value(WebsiteSourceConfig {
            url: normalized_url.to_string(),
        })
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let created_at = now();

        let source = Source {
            id: Uuid::new_v4(),
            workspace_id,
            source_type: SourceType::Website,
            config,
            created_at,
            updated_at: created_at,
        };

        tx.execute(
            "INSERT INTO sources (id, workspace_id, type, config, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                source.id.to_string(),
                source.workspace_id.to_string(),
                source.source_type.to_db_string(),
                source.config.to_string(),
                to_db_time(&source.created_at),
                to_db_time(&source.updated_at)
            ],
        )?;
        tx.commit()?;

        tracing::info!("Registered website source {} ({})", normalized_url, source.id);
        Ok(source)
    }

    fn get_source(&self, source_id: Uuid) -> StorageResult<Option<Source>> {
        let sql = format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS);

        let source = self
            .conn
            .query_row(&sql, params![source_id.to_string()], source_from_row)
            .optional()?;

        Ok(source)
    }

    fn list_sources(&self, workspace_id: Uuid) -> StorageResult<Vec<Source>> {
        let sql = format!(
            "SELECT {} FROM sources WHERE workspace_id = ?1 ORDER BY created_at DESC",
            SOURCE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let sources = stmt
            .query_map(params![workspace_id.to_string()], source_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::extract_content;
    use std::thread::sleep;
    use std::time::Duration;

    const HOME: &str = "https://example.com";

    fn storage_with_source() -> (SqliteStorage, Source) {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let source = storage
            .create_or_get_website_source(Uuid::new_v4(), HOME)
            .unwrap();
        (storage, source)
    }

    fn content(html: &str) -> ExtractedContent {
        extract_content(html, HOME)
    }

    #[test]
    fn test_create_in_memory() {
        assert!(SqliteStorage::new_in_memory().is_ok());
    }

    #[test]
    fn test_create_website_source() {
        let (storage, source) = storage_with_source();

        assert_eq!(source.source_type, SourceType::Website);
        assert_eq!(source.website_config().unwrap().url, HOME);
        assert_eq!(source.created_at, source.updated_at);

        let loaded = storage.get_source(source.id).unwrap();
        assert_eq!(loaded, Some(source));
    }

    #[test]
    fn test_create_source_is_idempotent() {
        let (mut storage, source) = storage_with_source();

        let again = storage
            .create_or_get_website_source(source.workspace_id, HOME)
            .unwrap();

        assert_eq!(again.id, source.id);
        assert_eq!(storage.list_sources(source.workspace_id).unwrap().len(), 1);
    }

    #[test]
    fn test_same_url_in_other_workspace_is_new_source() {
        let (mut storage, source) = storage_with_source();

        let other = storage
            .create_or_get_website_source(Uuid::new_v4(), HOME)
            .unwrap();

        assert_ne!(other.id, source.id);
    }

    #[test]
    fn test_list_sources_newest_first() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let workspace = Uuid::new_v4();

        let first = storage
            .create_or_get_website_source(workspace, "https://a.example.com")
            .unwrap();
        sleep(Duration::from_millis(2));
        let second = storage
            .create_or_get_website_source(workspace, "https://b.example.com")
            .unwrap();

        let listed: Vec<Uuid> = storage
            .list_sources(workspace)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec![second.id, first.id]);
    }

    #[test]
    fn test_get_missing_source() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert_eq!(storage.get_source(Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn test_insert_page() {
        let (mut storage, source) = storage_with_source();
        let html = "<html><head><title>Home</title></head><body><main>Hello world</main></body></html>";

        let page_id = storage
            .upsert_page(source.workspace_id, source.id, HOME, &content(html), html)
            .unwrap();

        let page = storage
            .get_page(source.workspace_id, source.id, HOME)
            .unwrap()
            .unwrap();
        assert_eq!(page.id, page_id);
        assert_eq!(page.title.as_deref(), Some("Home"));
        assert_eq!(page.content_text, "Hello world");
        assert_eq!(page.raw_html, html);
        assert_eq!(page.metadata.word_count, 2);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let (mut storage, source) = storage_with_source();
        let old_html = "<html><head><title>Old</title></head><body>old text</body></html>";
        let new_html = "<html><head><title>New</title></head><body>brand new text</body></html>";

        let first_id = storage
            .upsert_page(source.workspace_id, source.id, HOME, &content(old_html), old_html)
            .unwrap();
        let first = storage
            .get_page(source.workspace_id, source.id, HOME)
            .unwrap()
            .unwrap();

        sleep(Duration::from_millis(2));

        let second_id = storage
            .upsert_page(source.workspace_id, source.id, HOME, &content(new_html), new_html)
            .unwrap();
        let second = storage
            .get_page(source.workspace_id, source.id, HOME)
            .unwrap()
            .unwrap();

        assert_eq!(first_id, second_id);
        assert_eq!(storage.count_pages(source.id).unwrap(), 1);
        assert_eq!(second.title.as_deref(), Some("New"));
        assert_eq!(second.content_text, "brand new text");
        assert_eq!(second.raw_html, new_html);
        assert!(second.crawled_at > first.crawled_at);
    }

    #[test]
    fn test_unchanged_page_still_written() {
        let (mut storage, source) = storage_with_source();
        let html = "<html><body>same</body></html>";

        storage
            .upsert_page(source.workspace_id, source.id, HOME, &content(html), html)
            .unwrap();
        let first = storage.latest_crawl(source.id).unwrap().unwrap();

        sleep(Duration::from_millis(2));
        storage
            .upsert_page(source.workspace_id, source.id, HOME, &content(html), html)
            .unwrap();
        let second = storage.latest_crawl(source.id).unwrap().unwrap();

        assert!(second > first);
    }

    #[test]
    fn test_pages_are_scoped_by_source() {
        let (mut storage, source) = storage_with_source();
        let other = storage
            .create_or_get_website_source(source.workspace_id, "https://other.example.com")
            .unwrap();
        let html = "<html><body>text</body></html>";

        storage
            .upsert_page(source.workspace_id, source.id, HOME, &content(html), html)
            .unwrap();
        storage
            .upsert_page(source.workspace_id, other.id, HOME, &content(html), html)
            .unwrap();

        assert_eq!(storage.count_pages(source.id).unwrap(), 1);
        assert_eq!(storage.count_pages(other.id).unwrap(), 1);
        assert_eq!(storage.list_pages(source.workspace_id).unwrap().len(), 2);
    }

    #[test]
    fn test_list_pages_most_recent_first() {
        let (mut storage, source) = storage_with_source();
        let html = "<html><body>text</body></html>";

        storage
            .upsert_page(source.workspace_id, source.id, "https://example.com/a", &content(html), html)
            .unwrap();
        sleep(Duration::from_millis(2));
        storage
            .upsert_page(source.workspace_id, source.id, "https://example.com/b", &content(html), html)
            .unwrap();

        let urls: Vec<String> = storage
            .list_pages(source.workspace_id)
            .unwrap()
            .into_iter()
            .map(|p| p.url)
            .collect();
        assert_eq!(urls, vec!["https://example.com/b", "https://example.com/a"]);
    }

    #[test]
    fn test_latest_crawl_without_pages() {
        let (storage, source) = storage_with_source();
        assert_eq!(storage.latest_crawl(source.id).unwrap(), None);
        assert_eq!(storage.count_pages(source.id).unwrap(), 0);
    }

    #[test]
    fn test_page_for_unknown_source_rejected() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let html = "<html><body>text</body></html>";

        let result =
            storage.upsert_page(Uuid::new_v4(), Uuid::new_v4(), HOME, &content(html), html);

        assert!(matches!(result, Err(StorageError::Sqlite(_))));
    }

    #[test]
    fn test_metadata_extra_fields_roundtrip() {
        let (mut storage, source) = storage_with_source();
        let html = "<html><body>text</body></html>";
        let mut extracted = content(html);
        extracted
            .metadata
            .extra
            .insert("language".to_string(), serde_json::json!("en"));

        storage
            .upsert_page(source.workspace_id, source.id, HOME, &extracted, html)
            .unwrap();

        let page = storage
            .get_page(source.workspace_id, source.id, HOME)
            .unwrap()
            .unwrap();
        assert_eq!(page.metadata.extra.get("language"), Some(&serde_json::json!("en")));
        assert_eq!(page.metadata.url, HOME);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postd.db");
        let workspace = Uuid::new_v4();

        let created = {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage.create_or_get_website_source(workspace, HOME).unwrap()
        };

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.get_source(created.id).unwrap(), Some(created));
    }
}
