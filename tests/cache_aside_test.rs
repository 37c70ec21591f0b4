//! Index page and item detail lookups only reach the extractor on a cache miss

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use catalog_crawler::{
    CrawlError, IndexPage, IndexStrategy, ItemDetail, ItemDetailFetcher, KeyFilter,
};

mod common;
use common::{StubExtractor, TestScheme, open_cache, page_url};

#[tokio::test]
async fn test_listing_and_page_count_are_fetched_once() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(StubExtractor::new(2).with_pages(page_url("a", 1), 4));
    let cache = open_cache(&dir, "index.db", Duration::from_secs(3600)).await;
    let strategy = IndexPage::new(
        TestScheme::with_categories(&["a"]),
        cache.clone(),
        Arc::clone(&extractor),
    );

    assert_eq!(strategy.number_of_pages(&()).await.unwrap(), 4);
    assert_eq!(strategy.number_of_pages(&()).await.unwrap(), 4);
    let first = strategy.links(&()).await.unwrap();
    let second = strategy.links(&()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(extractor.calls.page_count(), 1);
    assert_eq!(extractor.calls.listing(), 1);

    let keys = cache.keys(KeyFilter::Valid).await.unwrap();
    assert_eq!(
        keys,
        vec![
            format!("l-test-{}", page_url("a", 1)),
            format!("n-test-{}", page_url("a", 1)),
        ]
    );
    assert_eq!(strategy.page_count_key(), Some(keys[1].clone()));
    assert_eq!(strategy.links_key(), Some(keys[0].clone()));
}

#[tokio::test]
async fn test_cached_listing_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let extractor = Arc::new(StubExtractor::new(2).with_pages(page_url("a", 1), 1));
        let cache = open_cache(&dir, "index.db", Duration::from_secs(3600)).await;
        let strategy = IndexPage::new(TestScheme::with_categories(&["a"]), cache.clone(), extractor);
        strategy.links(&()).await.unwrap();
        cache.close().await;
    }

    let extractor = Arc::new(StubExtractor::new(2));
    let cache = open_cache(&dir, "index.db", Duration::from_secs(3600)).await;
    let strategy = IndexPage::new(
        TestScheme::with_categories(&["a"]),
        cache,
        Arc::clone(&extractor),
    );
    assert_eq!(strategy.links(&()).await.unwrap().len(), 2);
    assert_eq!(extractor.calls.listing(), 0);
}

#[tokio::test]
async fn test_zero_ttl_always_fetches() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(StubExtractor::new(1).with_pages(page_url("a", 1), 2));
    let cache = open_cache(&dir, "index.db", Duration::ZERO).await;
    let strategy = IndexPage::new(
        TestScheme::with_categories(&["a"]),
        cache,
        Arc::clone(&extractor),
    );

    strategy.number_of_pages(&()).await.unwrap();
    strategy.number_of_pages(&()).await.unwrap();
    assert_eq!(extractor.calls.page_count(), 2);
}

#[tokio::test]
async fn test_detail_is_extracted_once() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(StubExtractor::new(0));
    let cache = open_cache(&dir, "item.db", Duration::from_secs(3600)).await;
    let fetcher = ItemDetailFetcher::new(cache, Arc::clone(&extractor));

    let url = "https://catalog.test/game/doom";
    let first = fetcher.get_detail(&(), url).await.unwrap();
    let second = fetcher.get_detail(&(), url).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.page_url, url);
    assert_eq!(extractor.calls.detail(), 1);
}

#[tokio::test]
async fn test_stored_detail_replaces_cached_record() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(StubExtractor::new(0));
    let cache = open_cache(&dir, "item.db", Duration::from_secs(3600)).await;
    let fetcher = ItemDetailFetcher::new(cache, Arc::clone(&extractor));

    let url = "https://catalog.test/game/doom";
    let mut detail: ItemDetail = fetcher.get_detail(&(), url).await.unwrap();
    detail.name = Some("Doom".to_string());
    fetcher.store_detail(&detail).await;

    let cached = fetcher.get_detail(&(), url).await.unwrap();
    assert_eq!(cached.name.as_deref(), Some("Doom"));
    assert_eq!(extractor.calls.detail(), 1);
    assert_eq!(fetcher.cache().len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_failed_detail_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let url = "https://catalog.test/game/broken";
    let extractor = Arc::new(StubExtractor::new(0).failing(url));
    let cache = open_cache(&dir, "item.db", Duration::from_secs(3600)).await;
    let fetcher = ItemDetailFetcher::new(cache, Arc::clone(&extractor));

    for _ in 0..2 {
        let result = fetcher.get_detail(&(), url).await;
        assert!(matches!(result, Err(CrawlError::Extraction(_))));
    }
    assert_eq!(extractor.calls.detail(), 2);
    assert!(fetcher.cache().is_empty().await.unwrap());
}
