//! Content extraction from page markup
//!
//! Turns raw HTML into the record that gets stored for a page:
//! - Title (from `<title>`, falling back to the first `<h1>`)
//! - Cleaned body text, with boilerplate subtrees removed first
//! - Metadata (word count, first heading, meta description, source URL)

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Elements whose text never counts as page content
const BOILERPLATE_SELECTOR: &str = "script, style, nav, footer, header, aside, iframe, noscript";

/// Candidate containers for the main content, in priority order
///
/// `body` comes last so every well-formed document yields some text.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".main-content",
    "#main-content",
    ".content",
    "#content",
    "body",
];

/// Metadata stored alongside a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Number of whitespace-separated words in the cleaned text
    pub word_count: usize,

    /// Text of the first `<h1>`
    pub h1: Option<String>,

    /// Content of `<meta name="description">`
    pub meta_description: Option<String>,

    /// URL the page was fetched from
    pub url: String,

    /// Additional fields, flattened into the stored JSON object
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Title, text and metadata extracted from one page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub content_text: String,
    pub metadata: PageMetadata,
}

/// Extracts clean text content and metadata from HTML
///
/// Parsing is best effort: unclosed tags and other malformed markup never
/// produce an error.
///
/// # Arguments
///
/// * `html` - The HTML content
/// * `url` - The URL the HTML was fetched from
///
/// # Example
///
/// ```
/// use postd_crawler::crawler::extract_content;
///
/// let html = "<html><body><nav>X</nav><main>Hello world</main></body></html>";
/// let content = extract_content(html, "https://example.com");
/// assert_eq!(content.content_text, "Hello world");
/// assert_eq!(content.metadata.word_count, 2);
/// ```
pub fn extract_content(html: &str, url: &str) -> ExtractedContent {
    let mut document = Html::parse_document(html);

    remove_boilerplate(&mut document);

    // Detached nodes stay in the arena, so queries start from the root element
    let root = document.root_element();

    let h1 = first_text(root, "h1");
    let title = first_text(root, "title").or_else(|| h1.clone());

    let content_text = collapse_whitespace(&main_text(root));
    let word_count = content_text.split_whitespace().count();

    ExtractedContent {
        title,
        content_text,
        metadata: PageMetadata {
            word_count,
            h1,
            meta_description: meta_description(root),
            url: url.to_string(),
            extra: Map::new(),
        },
    }
}

/// Detaches every boilerplate subtree from the document
fn remove_boilerplate(document: &mut Html) {
    let Ok(selector) = Selector::parse(BOILERPLATE_SELECTOR) else {
        return;
    };

    let ids: Vec<_> = document
        .root_element()
        .select(&selector)
        .map(|element| element.id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Trimmed text of the first element matching `selector`, if non-empty
fn first_text(root: ElementRef, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    root.select(&selector)
        .next()
        .map(|element| element_text(&element).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Text of the first content selector that matches anything
fn main_text(root: ElementRef) -> String {
    for candidate in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };

        let matches: Vec<ElementRef> = root.select(&selector).collect();
        if !matches.is_empty() {
            return matches.iter().map(element_text).collect();
        }
    }

    String::new()
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect()
}

fn meta_description(root: ElementRef) -> Option<String> {
    let selector = Selector::parse("meta[name=\"description\"]").ok()?;

    root.select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

/// Collapses every whitespace run (newlines included) to one space and trims
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
