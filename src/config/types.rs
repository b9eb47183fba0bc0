use serde::Deserialize;

/// Main configuration structure
///
/// Every section and key has a default, so an empty file (or no file at all)
/// yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page budget for a crawl when the caller does not pass one
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Total time allowed for a single page request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// What to do when persisting a page fails
    #[serde(rename = "on-store-error", default)]
    pub on_store_error: StoreFailurePolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            request_timeout_secs: default_request_timeout(),
            on_store_error: StoreFailurePolicy::default(),
        }
    }
}

/// Policy applied when the page store fails during a crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFailurePolicy {
    /// Stop the crawl and return the error; pages already written stay written
    #[default]
    Abort,
    /// Log the error, count the page and keep crawling
    Skip,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value (`Name/Version`)
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_max_pages() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    10
}

fn default_crawler_name() -> String {
    "POSTD-Bot".to_string()
}

fn default_crawler_version() -> String {
    "1.0".to_string()
}

fn default_database_path() -> String {
    "./postd.db".to_string()
}
