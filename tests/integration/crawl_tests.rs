//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and a SQLite
//! database in a temporary directory to exercise the full crawl cycle.

use postd_crawler::config::Config;
use postd_crawler::crawler::{crawl_website, CrawlOptions};
use postd_crawler::sources::{create_or_get_website_source, list_sources_with_stats};
use postd_crawler::storage::{PageStore, Source, SqliteStorage};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Temporary database plus the workspace the test works in
struct TestEnv {
    _dir: TempDir,
    store: Arc<Mutex<SqliteStorage>>,
    workspace_id: Uuid,
}

impl TestEnv {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage = SqliteStorage::new(&dir.path().join("postd.db")).expect("Failed to open DB");
        Self {
            _dir: dir,
            store: Arc::new(Mutex::new(storage)),
            workspace_id: Uuid::new_v4(),
        }
    }

    fn source_for(&self, url: &str) -> Source {
        let mut storage = self.store.lock().unwrap();
        create_or_get_website_source(&mut *storage, self.workspace_id, url).expect("Failed to create source")
    }

    async fn crawl(&self, source: &Source, max_pages: Option<usize>) -> usize {
        crawl_website(
            &Config::default(),
            self.store.clone(),
            self.workspace_id,
            source,
            CrawlOptions { max_pages },
        )
        .await
        .expect("Crawl failed")
        .pages_crawled
    }

    fn count_pages(&self, source: &Source) -> u64 {
        self.store.lock().unwrap().count_pages(source.id).unwrap()
    }
}

/// Builds a page with a title, some body copy and the given links
fn page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><nav>Menu</nav><main><p>Welcome to {}</p>{}</main></body></html>",
        title, title, anchors
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_with_cycles_fetches_each_page_once() {
    let server = MockServer::start().await;

    mount_page(&server, "/", page("Home", &["/about", "/team"]), 1).await;
    mount_page(&server, "/about", page("About", &["/", "/team", "/about?tab=2"]), 1).await;
    mount_page(&server, "/team", page("Team", &["/about", "/#top", "/team/"]), 1).await;
    mount_page(&server, "/team/", page("Team index", &["/"]), 1).await;

    let env = TestEnv::new();
    let source = env.source_for(&server.uri());

    let crawled = env.crawl(&source, None).await;

    assert_eq!(crawled, 4);
    assert_eq!(env.count_pages(&source), 4);
}

#[tokio::test]
async fn test_single_page_site() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Lonely", &[]), 1).await;

    let env = TestEnv::new();
    let source = env.source_for(&server.uri());

    assert_eq!(env.crawl(&source, Some(10)).await, 1);

    let storage = env.store.lock().unwrap();
    let root = source.website_config().unwrap().url;
    let stored = storage
        .get_page(env.workspace_id, source.id, &root)
        .unwrap()
        .expect("Root page not stored");
    assert_eq!(stored.title.as_deref(), Some("Lonely"));
    assert_eq!(stored.content_text, "Welcome to Lonely");
    assert_eq!(stored.metadata.word_count, 3);
    assert_eq!(stored.metadata.url, root);
    assert!(stored.raw_html.contains("<nav>Menu</nav>"));
}

#[tokio::test]
async fn test_not_found_root_counts_but_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string(page("Missing", &["/elsewhere"])))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let source = env.source_for(&server.uri());

    assert_eq!(env.crawl(&source, Some(10)).await, 1);
    assert_eq!(env.count_pages(&source), 0);
}

#[tokio::test]
async fn test_failed_page_does_not_stop_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/broken", "/works"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/works", page("Works", &[]), 1).await;

    let env = TestEnv::new();
    let source = env.source_for(&server.uri());

    assert_eq!(env.crawl(&source, None).await, 3);
    assert_eq!(env.count_pages(&source), 2);
}

#[tokio::test]
async fn test_default_budget_is_ten_pages() {
    let server = MockServer::start().await;

    let routes: Vec<String> = (1..=15).map(|i| format!("/p{}", i)).collect();
    let route_refs: Vec<&str> = routes.iter().map(String::as_str).collect();
    mount_page(&server, "/", page("Hub", &route_refs), 1).await;
    for (i, route) in routes.iter().enumerate() {
        // Breadth-first: the hub plus the first nine links fill the budget
        let hits = if i < 9 { 1 } else { 0 };
        mount_page(&server, route, page(route, &[]), hits).await;
    }

    let env = TestEnv::new();
    let source = env.source_for(&server.uri());

    assert_eq!(env.crawl(&source, None).await, 10);
    assert_eq!(env.count_pages(&source), 10);
}

#[tokio::test]
async fn test_explicit_budget_caps_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/a", "/b", "/c"]), 1).await;
    mount_page(&server, "/a", page("A", &[]), 1).await;
    mount_page(&server, "/b", page("B", &[]), 0).await;
    mount_page(&server, "/c", page("C", &[]), 0).await;

    let env = TestEnv::new();
    let source = env.source_for(&server.uri());

    assert_eq!(env.crawl(&source, Some(2)).await, 2);
}

#[tokio::test]
async fn test_cross_domain_links_never_fetched() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let other_port = url::Url::parse(&other.uri()).unwrap().port().unwrap();

    // Reached through a different host name, so never the same domain
    let foreign = format!("http://localhost:{}/landing", other_port);
    mount_page(&site, "/", page("Home", &[foreign.as_str(), "/local"]), 1).await;
    mount_page(&site, "/local", page("Local", &[]), 1).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Foreign", &[])))
        .expect(0)
        .mount(&other)
        .await;

    let env = TestEnv::new();
    let source = env.source_for(&site.uri());

    assert_eq!(env.crawl(&source, None).await, 2);
}

#[tokio::test]
async fn test_recrawl_updates_pages_in_place() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/about"]), 2).await;
    mount_page(&server, "/about", page("About", &[]), 2).await;

    let env = TestEnv::new();
    let source = env.source_for(&server.uri());
    let about_url = format!("{}/about", server.uri());

    assert_eq!(env.crawl(&source, None).await, 2);
    let first = env
        .store
        .lock()
        .unwrap()
        .get_page(env.workspace_id, source.id, &about_url)
        .unwrap()
        .expect("About page not stored");

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    // A second registration of the same site resolves to the same source
    let again = env.source_for(&format!("{}/", server.uri()));
    assert_eq!(again.id, source.id);

    assert_eq!(env.crawl(&again, None).await, 2);
    let second = env
        .store
        .lock()
        .unwrap()
        .get_page(env.workspace_id, source.id, &about_url)
        .unwrap()
        .expect("About page missing after recrawl");

    assert_eq!(env.count_pages(&source), 2);
    assert_eq!(second.id, first.id);
    assert!(second.crawled_at > first.crawled_at);
}

#[tokio::test]
async fn test_sources_listing_reflects_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &["/about"]), 1).await;
    mount_page(&server, "/about", page("About", &[]), 1).await;

    let env = TestEnv::new();
    let source = env.source_for(&server.uri());
    env.crawl(&source, None).await;

    let storage = env.store.lock().unwrap();
    let summaries = list_sources_with_stats(&*storage, env.workspace_id).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].source.id, source.id);
    assert_eq!(summaries[0].pages_count, 2);
    assert!(summaries[0].latest_crawl.is_some());

    let pages = storage.list_pages(env.workspace_id).unwrap();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].crawled_at >= pages[1].crawled_at);
}
