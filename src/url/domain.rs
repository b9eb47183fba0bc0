use url::Url;

/// Extracts the host of a URL, lowercased
///
/// The port is not part of the result, so `example.com:8080` and `example.com`
/// share a domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use postd_crawler::url::extract_domain;
///
/// let url = Url::parse("https://blog.example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when both URLs have the same host
///
/// URLs without a host never match anything.
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}
