//! URL handling module
//!
//! This module provides root URL normalization for website sources, link cleaning
//! for frontier identity, and host comparison for same-domain filtering.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_host};
pub use normalize::{clean_url, clean_url_str, normalize_url};
