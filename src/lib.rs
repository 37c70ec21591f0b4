pub mod browser_session;
pub mod browser_setup;
pub mod cache;
pub mod config;
pub mod crawl_engine;
pub mod detail;
pub mod discovery;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod index_page;
pub mod queue;
pub mod schema;
pub mod site;
pub mod storage;
pub mod utils;

pub use browser_session::BrowserSession;
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use cache::{Cache, CacheOptions, KeyFilter, PurgeStats};
pub use config::{PathContext, Settings, load_settings, resolve_settings_path};
pub use crawl_engine::{
    CrawlRequest, CrawlSummary, LogProgress, NoOpProgress, ProgressReporter, run_crawl,
    run_crawl_with,
};
pub use detail::ItemDetailFetcher;
pub use discovery::{DiscoveryInfo, DiscoveryObserver, NoOpObserver, SessionSource, discover};
pub use downloader::{DownloadOptions, DownloadReport, Downloader};
pub use error::{CrawlError, CrawlResult};
pub use extractor::{PageExtractor, SessionProvider};
pub use index_page::{IndexPage, IndexStrategy, UrlScheme};
pub use queue::{Queue, QueueConsumer, QueueState, QueueStats, WorkOutcome};
pub use schema::*;
pub use site::my_abandonware::{
    CatalogIndex, MyAbandonwareExtractor, SearchFilter, SiteScheme, StrategyKind, build_index,
};
pub use storage::{ItemFilter, ItemRepository, ItemSummary, OrderColumn};
