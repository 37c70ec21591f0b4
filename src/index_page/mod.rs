//! Index traversal strategies
//!
//! A strategy walks one category-paginated listing. The cursor operations are
//! pure; the two fetches (page count and page links) go through the index
//! cache before reaching the page extractor.

pub mod cursor;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::cache::Cache;
use crate::error::{CrawlError, CrawlResult};
use crate::extractor::PageExtractor;
use crate::schema::ItemReference;

pub use cursor::{CategoryCursor, TraversalCursor};

/// Traversal of one paginated resource, with or without categories
///
/// Setters return the URL of the new cursor position, `None` when the
/// position does not map to a URL (past the last category).
#[async_trait]
pub trait IndexStrategy: Send + Sync {
    type Session: Send + Sync;

    /// Stable name, part of every cache key
    fn name(&self) -> &str;

    fn has_categories(&self) -> bool;

    fn url(&self) -> Option<String>;

    /// Current category; always `None` without categories
    fn category(&self) -> Option<&str>;

    fn page(&self) -> u32;

    fn set_category(&mut self, category: &str) -> CrawlResult<Option<String>>;

    fn set_page(&mut self, page: u32) -> CrawlResult<Option<String>>;

    fn next_page(&mut self) -> Option<String>;

    /// Advance to page 1 of the next category
    ///
    /// Never fails; past the end `category()` turns `None`.
    fn next_category(&mut self) -> Option<String>;

    /// Page count of the current category
    async fn number_of_pages(&self, session: &Self::Session) -> CrawlResult<u32>;

    /// Item references on the current page
    async fn links(&self, session: &Self::Session) -> CrawlResult<Vec<ItemReference>>;
}

/// How a site turns a cursor into a URL
pub trait UrlScheme: Send + Sync {
    fn name(&self) -> &str;

    /// Ordered category list, `None` for a single filtered listing
    fn categories(&self) -> Option<Arc<[String]>>;

    fn build_url(&self, category: Option<&str>, page: u32) -> Option<String>;
}

/// Cache-backed strategy over a `UrlScheme` and a `PageExtractor`
pub struct IndexPage<U, E> {
    scheme: U,
    cursor: TraversalCursor,
    cache: Cache,
    extractor: Arc<E>,
}

impl<U: UrlScheme, E: PageExtractor + 'static> IndexPage<U, E> {
    pub fn new(scheme: U, cache: Cache, extractor: Arc<E>) -> Self {
        let cursor = TraversalCursor::new(scheme.categories());
        Self {
            scheme,
            cursor,
            cache,
            extractor,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> &TraversalCursor {
        &self.cursor
    }

    /// Cache key of the page count at the current cursor
    #[must_use]
    pub fn page_count_key(&self) -> Option<String> {
        self.url().map(|url| self.cache_key('n', &url))
    }

    /// Cache key of the listing at the current cursor
    #[must_use]
    pub fn links_key(&self) -> Option<String> {
        self.url().map(|url| self.cache_key('l', &url))
    }

    fn cache_key(&self, prefix: char, url: &str) -> String {
        format!("{prefix}-{}-{url}", self.scheme.name())
    }

    fn require_url(&self) -> CrawlResult<String> {
        self.url().ok_or_else(|| CrawlError::UnresolvableUrl {
            strategy: self.scheme.name().to_string(),
            category: self.cursor.category().map(str::to_string),
            page: self.cursor.page(),
        })
    }
}

#[async_trait]
impl<U, E> IndexStrategy for IndexPage<U, E>
where
    U: UrlScheme,
    E: PageExtractor + 'static,
{
    type Session = E::Session;

    fn name(&self) -> &str {
        self.scheme.name()
    }

    fn has_categories(&self) -> bool {
        self.cursor.has_categories()
    }

    fn url(&self) -> Option<String> {
        if self.cursor.has_categories() && self.cursor.category().is_none() {
            return None;
        }
        self.scheme.build_url(self.cursor.category(), self.cursor.page())
    }

    fn category(&self) -> Option<&str> {
        self.cursor.category()
    }

    fn page(&self) -> u32 {
        self.cursor.page()
    }

    fn set_category(&mut self, category: &str) -> CrawlResult<Option<String>> {
        self.cursor.set_category(category)?;
        Ok(self.url())
    }

    fn set_page(&mut self, page: u32) -> CrawlResult<Option<String>> {
        self.cursor.set_page(page)?;
        Ok(self.url())
    }

    fn next_page(&mut self) -> Option<String> {
        self.cursor.next_page();
        self.url()
    }

    fn next_category(&mut self) -> Option<String> {
        self.cursor.next_category();
        self.url()
    }

    async fn number_of_pages(&self, session: &Self::Session) -> CrawlResult<u32> {
        let url = self.require_url()?;
        let key = self.cache_key('n', &url);

        self.cache
            .get_or_fetch(&key, || async {
                info!("Fetching page count of {url}");
                self.extractor.fetch_page_count(session, &url).await
            })
            .await
    }

    async fn links(&self, session: &Self::Session) -> CrawlResult<Vec<ItemReference>> {
        let url = self.require_url()?;
        let key = self.cache_key('l', &url);

        self.cache
            .get_or_fetch(&key, || async {
                info!("Fetching item links of {url}");
                self.extractor.fetch_page_items(session, &url).await
            })
            .await
    }
}
