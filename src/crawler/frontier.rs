//! Crawl frontier: the visited set plus the FIFO queue of pending URLs
//!
//! A `Frontier` belongs to exactly one crawl. URLs are identified by their
//! cleaned form (scheme, host, port and path), so `https://example.com` and
//! `https://example.com/?ref=x` are the same entry.

use crate::url::clean_url_str;
use std::collections::{HashSet, VecDeque};

/// Visited set and pending queue of one crawl
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    /// Keys of URLs that have been dequeued
    visited: HashSet<String>,

    /// URLs waiting to be fetched, in discovery order
    queue: VecDeque<String>,

    /// Keys of the URLs currently in `queue`
    queued: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier holding only the root URL
    pub fn new(root_url: &str) -> Self {
        let mut frontier = Self::default();
        frontier.push(root_url.to_string());
        frontier
    }

    /// Dequeues the next URL that has not been visited yet and marks it visited
    ///
    /// Already visited entries are discarded on the way.
    pub fn next_url(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            let key = clean_url_str(&url);
            self.queued.remove(&key);

            if !self.visited.insert(key) {
                tracing::debug!("Skipping already visited {}", url);
                continue;
            }

            return Some(url);
        }

        None
    }

    /// Appends every link that is neither visited nor already queued
    ///
    /// # Returns
    ///
    /// The number of links added
    pub fn add_to_frontier<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        links.into_iter().filter(|link| self.push_new(link)).count()
    }

    /// Number of URLs waiting to be fetched
    pub fn frontier_size(&self) -> usize {
        self.queue.len()
    }

    /// Number of URLs dequeued so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn push_new(&mut self, link: &str) -> bool {
        let key = clean_url_str(link);
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }
        self.push(link.to_string())
    }

    fn push(&mut self, url: String) -> bool {
        self.queued.insert(clean_url_str(&url));
        self.queue.push_back(url);
        true
    }
}
