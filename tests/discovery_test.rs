//! Integration tests for the discovery engine over a stub extractor

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use catalog_crawler::{
    CrawlError, DiscoveryInfo, IndexPage, IndexStrategy, NoOpObserver, SessionProvider,
    SessionSource, discover,
};

mod common;
use common::{StubExtractor, TestScheme, item_url, open_cache, page_url};

async fn categorized(
    dir: &TempDir,
    extractor: &Arc<StubExtractor>,
    categories: &[&str],
) -> IndexPage<TestScheme, StubExtractor> {
    let cache = open_cache(dir, "index.db", Duration::from_secs(3600)).await;
    IndexPage::new(
        TestScheme::with_categories(categories),
        cache,
        Arc::clone(extractor),
    )
}

#[tokio::test]
async fn test_pages_then_categories_in_order() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(
        StubExtractor::new(2)
            .with_pages(page_url("a", 1), 2)
            .with_pages(page_url("b", 1), 2),
    );
    let mut strategy = categorized(&dir, &extractor, &["a", "b"]).await;

    let info = discover(
        &mut strategy,
        SessionSource::Borrowed(&()),
        &mut NoOpObserver,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        extractor.visited(),
        vec![
            page_url("a", 1),
            page_url("a", 2),
            page_url("b", 1),
            page_url("b", 2)
        ]
    );
    assert_eq!(info.items.len(), 8);
    assert_eq!(info.items[0].url, item_url(&page_url("a", 1), 0));
    assert_eq!(info.items[7].url, item_url(&page_url("b", 2), 1));
    assert_eq!(info.initial_url, page_url("a", 1));
    assert_eq!(info.start_category.as_deref(), Some("a"));
    assert_eq!(info.current_category, None);
    assert_eq!(extractor.calls.page_count(), 2);
    assert_eq!(extractor.calls.opened(), 0);
    assert_eq!(extractor.calls.closed(), 0);
}

#[tokio::test]
async fn test_stop_after_first_page_keeps_that_page() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(
        StubExtractor::new(2)
            .with_pages(page_url("a", 1), 2)
            .with_pages(page_url("b", 1), 2),
    );
    let mut strategy = categorized(&dir, &extractor, &["a", "b"]).await;

    let mut calls = 0;
    let mut observer = |_info: &DiscoveryInfo, stop: &CancellationToken| {
        calls += 1;
        stop.cancel();
    };
    let info = discover(
        &mut strategy,
        SessionSource::Borrowed(&()),
        &mut observer,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(extractor.visited(), vec![page_url("a", 1)]);
    assert_eq!(info.items.len(), 2);
    assert_eq!(info.current_category.as_deref(), Some("a"));
    assert_eq!(info.current_page, 1);
    assert_eq!(info.available_pages, 2);
}

#[tokio::test]
async fn test_observer_sees_accumulated_items() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(StubExtractor::new(3).with_pages(page_url("a", 1), 3));
    let mut strategy = categorized(&dir, &extractor, &["a"]).await;

    let mut sizes = Vec::new();
    let mut observer = |info: &DiscoveryInfo, _stop: &CancellationToken| {
        sizes.push((info.current_page, info.items.len()));
    };
    discover(
        &mut strategy,
        SessionSource::Borrowed(&()),
        &mut observer,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(sizes, vec![(1, 3), (2, 6), (3, 9)]);
}

#[tokio::test]
async fn test_empty_category_is_skipped() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(
        StubExtractor::new(1)
            .with_pages(page_url("a", 1), 1)
            .with_pages(page_url("c", 1), 1),
    );
    let mut strategy = categorized(&dir, &extractor, &["a", "b", "c"]).await;

    let info = discover(
        &mut strategy,
        SessionSource::Borrowed(&()),
        &mut NoOpObserver,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(extractor.visited(), vec![page_url("a", 1), page_url("c", 1)]);
    assert_eq!(info.items.len(), 2);
    assert_eq!(extractor.calls.page_count(), 3);
}

#[tokio::test]
async fn test_start_category_and_page_are_honoured() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(
        StubExtractor::new(1)
            .with_pages(page_url("a", 1), 5)
            .with_pages(page_url("b", 1), 3)
            .with_pages(page_url("b", 2), 3)
            .with_pages(page_url("c", 1), 1),
    );
    let mut strategy = categorized(&dir, &extractor, &["a", "b", "c"]).await;
    strategy.set_category("b").unwrap();
    strategy.set_page(2).unwrap();

    let info = discover(
        &mut strategy,
        SessionSource::Borrowed(&()),
        &mut NoOpObserver,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        extractor.visited(),
        vec![page_url("b", 2), page_url("b", 3), page_url("c", 1)]
    );
    assert_eq!(info.start_page, 2);
    assert_eq!(info.start_category.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_single_listing_without_categories() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(StubExtractor::new(2).with_pages(page_url("all", 1), 3));
    let cache = open_cache(&dir, "index.db", Duration::from_secs(3600)).await;
    let mut strategy = IndexPage::new(
        TestScheme::without_categories(),
        cache,
        Arc::clone(&extractor),
    );

    let info = discover(
        &mut strategy,
        SessionSource::Borrowed(&()),
        &mut NoOpObserver,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        extractor.visited(),
        vec![page_url("all", 1), page_url("all", 2), page_url("all", 3)]
    );
    assert_eq!(info.items.len(), 6);
    assert_eq!(info.start_category, None);
}

#[tokio::test]
async fn test_cancelled_before_start_fetches_no_listing() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(StubExtractor::new(2).with_pages(page_url("a", 1), 2));
    let mut strategy = categorized(&dir, &extractor, &["a", "b"]).await;

    let stop = CancellationToken::new();
    stop.cancel();
    let info = discover(
        &mut strategy,
        SessionSource::Borrowed(&()),
        &mut NoOpObserver,
        stop,
    )
    .await
    .unwrap();

    assert!(info.items.is_empty());
    assert_eq!(extractor.calls.listing(), 0);
    assert_eq!(info.current_category.as_deref(), Some("a"));
}

#[tokio::test]
async fn test_launched_session_is_closed() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(StubExtractor::new(1).with_pages(page_url("a", 1), 1));
    let mut strategy = categorized(&dir, &extractor, &["a"]).await;

    let provider: &dyn SessionProvider<Session = ()> = extractor.as_ref();
    discover(
        &mut strategy,
        SessionSource::Launch(provider),
        &mut NoOpObserver,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(extractor.calls.opened(), 1);
    assert_eq!(extractor.calls.closed(), 1);
}

#[tokio::test]
async fn test_launched_session_is_closed_on_failure() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(
        StubExtractor::new(1)
            .with_pages(page_url("a", 1), 1)
            .failing(page_url("b", 1)),
    );
    let mut strategy = categorized(&dir, &extractor, &["a", "b"]).await;

    let provider: &dyn SessionProvider<Session = ()> = extractor.as_ref();
    let result = discover(
        &mut strategy,
        SessionSource::Launch(provider),
        &mut NoOpObserver,
        CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(CrawlError::Extraction(_))));
    assert_eq!(extractor.calls.opened(), 1);
    assert_eq!(extractor.calls.closed(), 1);
}

#[tokio::test]
async fn test_cursor_past_last_category_is_unresolvable() {
    let dir = TempDir::new().unwrap();
    let extractor = Arc::new(StubExtractor::new(1));
    let mut strategy = categorized(&dir, &extractor, &["a", "b"]).await;
    strategy.set_category("b").unwrap();
    assert_eq!(strategy.next_category(), None);

    let provider: &dyn SessionProvider<Session = ()> = extractor.as_ref();
    let result = discover(
        &mut strategy,
        SessionSource::Launch(provider),
        &mut NoOpObserver,
        CancellationToken::new(),
    )
    .await;

    assert!(matches!(
        result,
        Err(CrawlError::UnresolvableUrl { category: None, .. })
    ));
    assert_eq!(extractor.calls.page_count(), 0);
    assert_eq!(extractor.calls.closed(), 1);
}
