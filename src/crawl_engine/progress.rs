//! Progress reporting for crawl runs
//!
//! Defines the `ProgressReporter` trait called at the lifecycle points of
//! `run_crawl` and a no-op implementation for callers that do not watch.

use crate::discovery::DiscoveryInfo;

/// Receives lifecycle events of one crawl
///
/// Implementations are shared with the queue consumers, so item events may
/// arrive concurrently from several tasks.
pub trait ProgressReporter: Send + Sync {
    /// The browser session is up
    fn report_session_launched(&self);

    /// A listing page was visited; `queued` items are new
    fn report_page_discovered(&self, info: &DiscoveryInfo, queued: usize);

    /// An item record was written to the repository
    fn report_item_stored(&self, url: &str, id: i64, remaining: usize);

    /// Discovery ended, the queue is draining
    fn report_discovery_finished(&self, items: usize);

    /// Everything is stored and the session is closed
    fn report_completed(&self, summary: &super::CrawlSummary);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_session_launched(&self) {}

    #[inline(always)]
    fn report_page_discovered(&self, _info: &DiscoveryInfo, _queued: usize) {}

    #[inline(always)]
    fn report_item_stored(&self, _url: &str, _id: i64, _remaining: usize) {}

    #[inline(always)]
    fn report_discovery_finished(&self, _items: usize) {}

    #[inline(always)]
    fn report_completed(&self, _summary: &super::CrawlSummary) {}
}

/// Reports every event through `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report_session_launched(&self) {
        tracing::info!("Browser session launched");
    }

    fn report_page_discovered(&self, info: &DiscoveryInfo, queued: usize) {
        tracing::info!(
            "Page {}/{} of {}: {} items so far, {queued} new",
            info.current_page,
            info.available_pages,
            info.current_category.as_deref().unwrap_or("search"),
            info.items.len()
        );
    }

    fn report_item_stored(&self, url: &str, id: i64, remaining: usize) {
        tracing::info!("Stored #{id} {url} ({remaining} waiting)");
    }

    fn report_discovery_finished(&self, items: usize) {
        tracing::info!("Discovery finished with {items} items, waiting for details");
    }

    fn report_completed(&self, summary: &super::CrawlSummary) {
        tracing::info!(
            "Crawl completed: {} discovered, {} stored, {} failed",
            summary.discovered,
            summary.stats.completed,
            summary.stats.failed
        );
    }
}
