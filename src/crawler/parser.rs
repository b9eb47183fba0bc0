//! HTML parser for same-domain link discovery
//!
//! Only `<a href>` links are followed. Each one is resolved against the page
//! URL, restricted to the page's host, and reduced to scheme + host + path.

use crate::url::{clean_url, same_host};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the internal links of a page
///
/// # Rules
///
/// **Include:**
/// - `<a href="...">` resolving (relative, absolute or protocol-relative) to an
///   http(s) URL on the same host as `base_url`
///
/// **Exclude:**
/// - Hrefs that fail to resolve
/// - Links to any other host, subdomains included
/// - Links that are the page itself once query and fragment are dropped
///
/// The result holds each cleaned URL once, in first-seen order.
///
/// # Arguments
///
/// * `html` - The HTML content
/// * `base_url` - The URL the HTML was fetched from
///
/// # Example
///
/// ```
/// use postd_crawler::crawler::extract_internal_links;
///
/// let html = r#"<a href="/team?tab=1">Team</a><a href="https://other.com/">Out</a>"#;
/// let links = extract_internal_links(html, "https://example.com/about");
/// assert_eq!(links, vec!["https://example.com/team".to_string()]);
/// ```
pub fn extract_internal_links(html: &str, base_url: &str) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            tracing::debug!("Cannot resolve links against {}: {}", base_url, e);
            return Vec::new();
        }
    };
    let base_clean = clean_url(&base);

    let document = Html::parse_document(html);
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(absolute) = resolve_link(href, &base) else {
            continue;
        };

        if !same_host(&absolute, &base) {
            continue;
        }

        let cleaned = clean_url(&absolute);
        if cleaned == base_clean {
            continue;
        }

        if seen.insert(cleaned.clone()) {
            links.push(cleaned);
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for hrefs that do not resolve or that resolve to another
/// scheme (`mailto:`, `javascript:`, `tel:`, `data:` ...).
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}
