//! Crawl Engine Module
//!
//! Wires discovery, the work queue, detail fetching, downloads and storage
//! into a single crawl run.

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{CrawlRequest, CrawlSummary, run_crawl, run_crawl_with};
pub use progress::{LogProgress, NoOpProgress, ProgressReporter};
