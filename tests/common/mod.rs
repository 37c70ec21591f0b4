//! Test utilities shared by the catalog crawler integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use catalog_crawler::{
    Cache, CacheOptions, CrawlError, CrawlResult, ItemDetail, ItemReference, PageExtractor,
    SessionProvider, Settings, UrlScheme,
};

/// Call counters of a `StubExtractor`
#[derive(Debug, Default)]
pub struct Calls {
    pub page_count: AtomicUsize,
    pub listing: AtomicUsize,
    pub detail: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl Calls {
    pub fn page_count(&self) -> usize {
        self.page_count.load(Ordering::SeqCst)
    }

    pub fn listing(&self) -> usize {
        self.listing.load(Ordering::SeqCst)
    }

    pub fn detail(&self) -> usize {
        self.detail.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Extractor answering from memory instead of a browser
///
/// Page counts are looked up by URL (0 when unknown). Every listing page
/// holds `items_per_page` references derived from the page URL.
#[derive(Debug, Default)]
pub struct StubExtractor {
    page_counts: HashMap<String, u32>,
    items_per_page: usize,
    failing: HashSet<String>,
    pub calls: Calls,
    /// Listing URLs in the order they were fetched
    pub visited: Mutex<Vec<String>>,
}

impl StubExtractor {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            items_per_page,
            ..Self::default()
        }
    }

    pub fn with_pages(mut self, url: impl Into<String>, count: u32) -> Self {
        self.page_counts.insert(url.into(), count);
        self
    }

    /// Make every fetch of `url` fail
    pub fn failing(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }

    fn check(&self, url: &str) -> CrawlResult<()> {
        if self.failing.contains(url) {
            return Err(CrawlError::Extraction(format!("{url}: stub failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for StubExtractor {
    type Session = ();

    async fn open_session(&self) -> CrawlResult<()> {
        self.calls.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close_session(&self, _session: ()) -> CrawlResult<()> {
        self.calls.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PageExtractor for StubExtractor {
    async fn fetch_page_count(&self, _session: &(), url: &str) -> CrawlResult<u32> {
        self.calls.page_count.fetch_add(1, Ordering::SeqCst);
        self.check(url)?;
        Ok(self.page_counts.get(url).copied().unwrap_or_default())
    }

    async fn fetch_page_items(&self, _session: &(), url: &str) -> CrawlResult<Vec<ItemReference>> {
        self.calls.listing.fetch_add(1, Ordering::SeqCst);
        self.check(url)?;
        self.visited.lock().push(url.to_string());
        Ok((0..self.items_per_page)
            .map(|i| ItemReference::new(item_url(url, i)).with_name(format!("Item {i}")))
            .collect())
    }

    async fn fetch_item_detail(&self, _session: &(), url: &str) -> CrawlResult<ItemDetail> {
        self.calls.detail.fetch_add(1, Ordering::SeqCst);
        self.check(url)?;
        let mut detail = ItemDetail::new(url);
        detail.platform = Some("DOS".to_string());
        detail.year = Some(1993);
        Ok(detail)
    }
}

/// URL of the `index`-th item on the listing at `page_url`
pub fn item_url(page_url: &str, index: usize) -> String {
    format!("{page_url}#item-{index}")
}

/// Scheme with URLs `https://catalog.test/{category}/{page}`
#[derive(Debug, Clone)]
pub struct TestScheme {
    categories: Option<Arc<[String]>>,
}

impl TestScheme {
    pub fn with_categories(categories: &[&str]) -> Self {
        Self {
            categories: Some(categories.iter().map(|c| (*c).to_string()).collect()),
        }
    }

    pub fn without_categories() -> Self {
        Self { categories: None }
    }
}

impl UrlScheme for TestScheme {
    fn name(&self) -> &str {
        "test"
    }

    fn categories(&self) -> Option<Arc<[String]>> {
        self.categories.clone()
    }

    fn build_url(&self, category: Option<&str>, page: u32) -> Option<String> {
        Some(page_url(category.unwrap_or("all"), page))
    }
}

/// Listing URL of `category` / `page` under `TestScheme`
pub fn page_url(category: &str, page: u32) -> String {
    format!("https://catalog.test/{category}/{page}")
}

/// Cache in `dir` with the given lifetime
pub async fn open_cache(dir: &TempDir, file: &str, ttl: Duration) -> Cache {
    Cache::open(CacheOptions::new(dir.path().join(file), ttl))
        .await
        .expect("Failed to open test cache")
}

/// Settings keeping every file below `dir`
pub fn test_settings(dir: &Path) -> Settings {
    let out = dir.join("out");
    Settings::builder()
        .internal_data_path(dir.join("data"))
        .item_info_path(format!("{}/[platform]/[name]/info.json", out.display()))
        .item_downloads_path(format!("{}/[platform]/[name]/files", out.display()))
        .item_screenshots_path(format!("{}/[platform]/[name]/screens", out.display()))
        .concurrency(2)
        .build()
        .expect("Failed to build test settings")
}
