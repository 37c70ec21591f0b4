//! Cache-aside retrieval of item detail records
//!
//! Details are keyed by their page URL in the item cache, whose lifetime is
//! configured separately from the index cache.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::Cache;
use crate::error::CrawlResult;
use crate::extractor::PageExtractor;
use crate::schema::ItemDetail;

pub struct ItemDetailFetcher<E> {
    cache: Cache,
    extractor: Arc<E>,
}

impl<E> Clone for ItemDetailFetcher<E> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            extractor: Arc::clone(&self.extractor),
        }
    }
}

impl<E: PageExtractor> ItemDetailFetcher<E> {
    pub fn new(cache: Cache, extractor: Arc<E>) -> Self {
        Self { cache, extractor }
    }

    /// Detail of the item at `url`, extracted only on a cache miss
    pub async fn get_detail(&self, session: &E::Session, url: &str) -> CrawlResult<ItemDetail> {
        self.cache
            .get_or_fetch(url, || async {
                info!("Fetching item detail {url}");
                self.extractor.fetch_item_detail(session, url).await
            })
            .await
    }

    /// Write `detail` back under its page URL with a fresh lifetime
    ///
    /// Used after downloads resolved local paths, so the cached record is
    /// updated in place.
    pub async fn store_detail(&self, detail: &ItemDetail) {
        debug!("Updating cached detail {}", detail.page_url);
        self.cache.set(&detail.page_url, detail).await;
    }

    #[must_use]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}
