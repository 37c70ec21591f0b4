//! Main crawl orchestration
//!
//! One session serves discovery and every detail fetch:
//! - discovery walks the strategy and feeds unseen references into the queue
//! - queue consumers fetch details, optionally download files and persist
//! - the session is closed once the queue has drained

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::progress::ProgressReporter;
use crate::cache::{Cache, CacheOptions};
use crate::config::Settings;
use crate::detail::ItemDetailFetcher;
use crate::discovery::{DiscoveryInfo, DiscoveryObserver, SessionSource, discover};
use crate::downloader::{DownloadOptions, Downloader};
use crate::error::CrawlResult;
use crate::extractor::PageExtractor;
use crate::index_page::IndexStrategy;
use crate::queue::{Queue, QueueConsumer, QueueStats};
use crate::schema::ItemReference;
use crate::site::my_abandonware::{
    MyAbandonwareExtractor, SearchFilter, StrategyKind, build_index,
};
use crate::storage::ItemRepository;

/// How long to wait for finishing tasks to release the shared session
const SESSION_RELEASE_ATTEMPTS: u32 = 50;
const SESSION_RELEASE_INTERVAL: Duration = Duration::from_millis(20);

/// What to crawl
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub strategy: StrategyKind,
    /// Category to start from, the first one when unset
    pub category: Option<String>,
    pub start_page: Option<u32>,
    /// Stop discovery after this many listing pages
    pub max_pages: Option<u32>,
    pub download: bool,
    /// Used by the search strategy only
    pub filter: SearchFilter,
}

impl CrawlRequest {
    #[must_use]
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            category: None,
            start_page: None,
            max_pages: None,
            download: false,
            filter: SearchFilter::default(),
        }
    }
}

/// Outcome of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// References found, duplicates included
    pub discovered: usize,
    /// Distinct references handed to the queue
    pub queued: usize,
    pub pages: u32,
    pub stats: QueueStats,
    /// Ended by the caller's stop token rather than by running out of pages
    pub stopped: bool,
}

/// Crawl the catalog with the browser-backed extractor
///
/// # Errors
///
/// Fails when a store cannot be opened, the browser cannot be launched or
/// discovery fails. Items queued before a discovery failure are still stored.
pub async fn run_crawl<P: ProgressReporter + 'static>(
    settings: &Settings,
    request: CrawlRequest,
    progress: Arc<P>,
    stop: CancellationToken,
) -> CrawlResult<CrawlSummary> {
    let extractor = Arc::new(MyAbandonwareExtractor::new(settings.headless()));
    run_crawl_with(settings, request, extractor, progress, stop).await
}

/// Crawl the catalog through any extractor
///
/// # Errors
///
/// See [`run_crawl`].
pub async fn run_crawl_with<E, P>(
    settings: &Settings,
    request: CrawlRequest,
    extractor: Arc<E>,
    progress: Arc<P>,
    stop: CancellationToken,
) -> CrawlResult<CrawlSummary>
where
    E: PageExtractor + 'static,
    E::Session: 'static,
    P: ProgressReporter + 'static,
{
    let index_cache = Cache::open(CacheOptions::new(
        settings.index_cache_path(),
        settings.cache_index_ttl(),
    ))
    .await?;
    let item_cache = Cache::open(CacheOptions::new(
        settings.item_cache_path(),
        settings.cache_item_ttl(),
    ))
    .await?;
    let repository = ItemRepository::open(&settings.item_database_path()).await?;
    let downloader = if request.download {
        Some(Downloader::new(settings)?)
    } else {
        None
    };

    let mut strategy = build_index(
        request.strategy,
        request.filter.clone(),
        index_cache.clone(),
        Arc::clone(&extractor),
    )?;
    if let Some(category) = request.category.as_deref() {
        strategy.set_category(category)?;
    }
    if let Some(page) = request.start_page {
        strategy.set_page(page)?;
    }

    let session = Arc::new(extractor.open_session().await?);
    progress.report_session_launched();

    let pipeline = ItemPipeline {
        fetcher: ItemDetailFetcher::new(item_cache.clone(), Arc::clone(&extractor)),
        session: Arc::clone(&session),
        downloader,
        repository: repository.clone(),
        progress: Arc::clone(&progress),
    };
    let queue = match Queue::new(settings.concurrency(), pipeline) {
        Ok(queue) => queue,
        Err(e) => {
            release_session(extractor.as_ref(), session).await;
            return Err(e);
        }
    };

    let mut enqueuer = Enqueuer {
        queue: queue.clone(),
        progress: Arc::clone(&progress),
        seen: HashSet::new(),
        forwarded: 0,
        queued: 0,
        pages: 0,
        max_pages: request.max_pages,
    };

    // Own token so the page limit ends discovery without stopping the queue
    let discovery_stop = stop.child_token();
    let discovery = discover(
        &mut strategy,
        SessionSource::Borrowed(session.as_ref()),
        &mut enqueuer,
        discovery_stop,
    )
    .await;

    if stop.is_cancelled() {
        info!("Crawl stopped, finishing in-flight items");
        queue.stop();
    }
    let discovered = discovery.as_ref().map_or(0, |info| info.items.len());
    progress.report_discovery_finished(discovered);

    queue.wait_idle().await;
    let stats = queue.stats();
    let (queued, pages) = (enqueuer.queued, enqueuer.pages);
    drop(enqueuer);
    drop(queue);

    release_session(extractor.as_ref(), session).await;
    index_cache.close().await;
    item_cache.close().await;
    repository.close().await;

    let discovery = discovery?;
    let summary = CrawlSummary {
        discovered: discovery.items.len(),
        queued,
        pages,
        stats,
        stopped: stop.is_cancelled(),
    };
    progress.report_completed(&summary);
    Ok(summary)
}

/// Close the shared session once every task has let go of it
async fn release_session<E: PageExtractor>(extractor: &E, mut session: Arc<E::Session>) {
    for _ in 0..SESSION_RELEASE_ATTEMPTS {
        match Arc::try_unwrap(session) {
            Ok(owned) => {
                if let Err(e) = extractor.close_session(owned).await {
                    warn!("Failed to close crawl session: {e}");
                }
                return;
            }
            Err(shared) => {
                session = shared;
                tokio::time::sleep(SESSION_RELEASE_INTERVAL).await;
            }
        }
    }
    warn!("Crawl session still shared, leaving it to be dropped");
}

/// Discovery observer feeding unseen references into the queue
struct Enqueuer<P: ?Sized> {
    queue: Queue<ItemReference>,
    progress: Arc<P>,
    seen: HashSet<String>,
    /// Prefix of `DiscoveryInfo::items` already looked at
    forwarded: usize,
    queued: usize,
    pages: u32,
    max_pages: Option<u32>,
}

#[async_trait]
impl<P: ProgressReporter + ?Sized> DiscoveryObserver for Enqueuer<P> {
    async fn on_discover(&mut self, info: &DiscoveryInfo, stop: &CancellationToken) {
        let fresh: Vec<ItemReference> = info
            .items
            .get(self.forwarded..)
            .unwrap_or_default()
            .iter()
            .filter(|item| self.seen.insert(item.url.clone()))
            .cloned()
            .collect();
        self.forwarded = info.items.len();
        self.pages += 1;

        let count = fresh.len();
        self.queued += count;
        self.queue.add_items(fresh);
        self.progress.report_page_discovered(info, count);

        if let Some(max_pages) = self.max_pages
            && self.pages >= max_pages
        {
            info!("Reached page limit of {max_pages}");
            stop.cancel();
        }
    }
}

/// Queue consumer storing one item
struct ItemPipeline<E: PageExtractor, P: ?Sized> {
    fetcher: ItemDetailFetcher<E>,
    session: Arc<E::Session>,
    downloader: Option<Downloader>,
    repository: ItemRepository,
    progress: Arc<P>,
}

#[async_trait]
impl<E, P> QueueConsumer<ItemReference> for ItemPipeline<E, P>
where
    E: PageExtractor + 'static,
    E::Session: 'static,
    P: ProgressReporter + ?Sized + 'static,
{
    async fn consume(&self, item: ItemReference, remaining: usize) -> anyhow::Result<()> {
        let mut detail = self.fetcher.get_detail(&self.session, &item.url).await?;
        if detail.name.is_none() {
            detail.name = item.name;
        }

        if let Some(downloader) = &self.downloader {
            let report = downloader
                .download_item(&mut detail, DownloadOptions::default())
                .await;
            debug!(
                "{}: {} downloaded, {} skipped, {} failed",
                detail.page_url, report.downloaded, report.skipped, report.failed
            );
            if report.downloaded > 0 {
                self.fetcher.store_detail(&detail).await;
            }
        }

        let id = self.repository.upsert(&detail).await?;
        self.progress
            .report_item_stored(&detail.page_url, id, remaining);
        Ok(())
    }
}
