//! Database schema definitions

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Registered crawl targets, one per (workspace, normalized url) for websites
CREATE TABLE IF NOT EXISTS sources (
    id TEXT PRIMARY KEY,
    workspace_id TEXT NOT NULL,
    type TEXT NOT NULL,
    config TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sources_workspace ON sources(workspace_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_sources_website_url
    ON sources(workspace_id, type, json_extract(config, '$.url'));

-- Extracted page content, one row per (workspace, source, url)
CREATE TABLE IF NOT EXISTS crawled_pages (
    id TEXT PRIMARY KEY,
    workspace_id TEXT NOT NULL,
    source_id TEXT NOT NULL REFERENCES sources(id),
    url TEXT NOT NULL,
    title TEXT,
    content_text TEXT NOT NULL,
    raw_html TEXT NOT NULL,
    metadata TEXT NOT NULL,
    crawled_at TEXT NOT NULL,
    UNIQUE(workspace_id, source_id, url)
);

CREATE INDEX IF NOT EXISTS idx_crawled_pages_workspace ON crawled_pages(workspace_id, crawled_at);
CREATE INDEX IF NOT EXISTS idx_crawled_pages_source ON crawled_pages(source_id, crawled_at);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
