//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; missing keys fall back to the crawler defaults
//! (10 pages, 10 second timeout, `POSTD-Bot/1.0`).
//!
//! # Example
//!
//! ```no_run
//! use postd_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("postd.toml")).unwrap();
//! println!("Crawler will fetch at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, OutputConfig, StoreFailurePolicy, UserAgentConfig};

pub use parser::{load_config, load_config_or_default, parse_config};
