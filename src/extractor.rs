//! Contracts of the page-extraction collaborator.
//!
//! The core never parses markup itself. It asks a `PageExtractor` for page
//! counts, listings and item details, passing along an opaque session that
//! the extractor knows how to open and close.

use async_trait::async_trait;

use crate::error::CrawlResult;
use crate::schema::{ItemDetail, ItemReference};

/// Opens and closes the sessions extraction runs against
///
/// A session may be shared read-only by several concurrent fetches.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: Send + Sync;

    /// Launch a fresh session owned by the caller
    async fn open_session(&self) -> CrawlResult<Self::Session>;

    /// Close a session previously returned by `open_session`
    async fn close_session(&self, session: Self::Session) -> CrawlResult<()>;
}

/// Site-specific extraction of structured data from pages
#[async_trait]
pub trait PageExtractor: SessionProvider {
    /// Number of pages of the listing at `url`
    ///
    /// Returns 0 when the page has no pagination markup; errors are reserved
    /// for transport failures.
    async fn fetch_page_count(&self, session: &Self::Session, url: &str) -> CrawlResult<u32>;

    /// Item references listed at `url`, empty when nothing matches
    async fn fetch_page_items(
        &self,
        session: &Self::Session,
        url: &str,
    ) -> CrawlResult<Vec<ItemReference>>;

    /// Best-effort detail record of the item at `url`
    async fn fetch_item_detail(&self, session: &Self::Session, url: &str)
    -> CrawlResult<ItemDetail>;
}
