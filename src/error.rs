//! Core error type for catalog crawling operations.
//!
//! Collaborator boundaries (browser, downloads, CLI) work with `anyhow`;
//! everything the core hands back to a caller is a `CrawlError`.

use thiserror::Error;

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Error types for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Backing sqlite store failed
    #[error("Storage error: {0}")]
    Cache(#[from] sqlx::Error),

    /// A value could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Browser session could not be launched, used or closed
    #[error("Browser error: {0}")]
    Browser(String),

    /// DOM extraction failed at transport level
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Category is not part of the strategy's known list
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    /// Pages are 1-based
    #[error("Invalid page number {0}, pages start at 1")]
    InvalidPage(u32),

    /// The cursor state does not map to a URL
    #[error("Strategy '{strategy}' cannot resolve a URL for category {category:?}, page {page}")]
    UnresolvableUrl {
        strategy: String,
        category: Option<String>,
        page: u32,
    },

    /// Settings are missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A file download failed
    #[error("Download failed: {0}")]
    Download(String),

    /// Other errors
    #[error("Crawl error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Other(format!("{err:#}"))
    }
}
