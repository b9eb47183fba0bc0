use crate::UrlError;
use url::Url;

/// Normalizes a user-supplied website address into a canonical root URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Prepend `https://` when neither `http://` nor `https://` is present
/// 3. Remove trailing slashes
/// 4. Reject the result if it does not parse as a URL with a host
///
/// Case, default ports and query order are left untouched, so inputs that differ
/// only in those respects stay distinct.
///
/// # Arguments
///
/// * `raw` - The address as typed by the user
///
/// # Returns
///
/// * `Ok(String)` - Normalized URL string
/// * `Err(UrlError)` - The input is empty or has no host
///
/// # Examples
///
/// ```
/// use postd_crawler::url::normalize_url;
///
/// assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
/// assert_eq!(normalize_url("https://example.com/").unwrap(), "https://example.com");
/// ```
pub fn normalize_url(raw: &str) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Malformed("URL cannot be empty".to_string()));
    }

    let mut normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    // Trailing whitespace can hide another slash: "https://x.com/ /"
    loop {
        let end = normalized.trim_end().len();
        normalized.truncate(end);
        if !normalized.ends_with('/') {
            break;
        }
        normalized.pop();
    }

    let parsed = Url::parse(&normalized).map_err(|e| UrlError::Parse(e.to_string()))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(normalized),
        _ => Err(UrlError::MissingDomain),
    }
}

/// Returns the scheme, host, port and path of a URL with query and fragment dropped
///
/// This is the identity used for frontier de-duplication and self-link detection.
///
/// ```
/// use postd_crawler::url::clean_url;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/about?ref=nav#team").unwrap();
/// assert_eq!(clean_url(&url), "https://example.com/about");
/// ```
pub fn clean_url(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}

/// Cleans a URL string, falling back to the input when it does not parse
pub fn clean_url_str(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => clean_url(&parsed),
        Err(_) => url.to_string(),
    }
}
