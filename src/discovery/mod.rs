//! Discovery engine
//!
//! Walks every page of every category of an `IndexStrategy`, accumulating
//! item references in visiting order:
//! - pages strictly increasing inside a category
//! - categories in list order, page count re-fetched for each
//! - stop requests honoured after the observer returns, never mid-page
//!
//! A session launched by the engine is closed before `discover` returns,
//! whatever the outcome. A borrowed session is left alone.

pub mod observer;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{CrawlError, CrawlResult};
use crate::extractor::SessionProvider;
use crate::index_page::IndexStrategy;
use crate::schema::ItemReference;

pub use observer::{DiscoveryObserver, NoOpObserver};

/// Progress of a discovery run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryInfo {
    pub initial_url: String,
    pub available_pages: u32,
    pub start_page: u32,
    pub current_page: u32,
    pub start_category: Option<String>,
    pub current_category: Option<String>,
    /// Every reference found so far, in visiting order
    pub items: Vec<ItemReference>,
}

/// Where the session for a run comes from
pub enum SessionSource<'a, T> {
    /// Caller-owned session, never closed by the engine
    Borrowed(&'a T),
    /// Launched for this run and closed when it ends
    Launch(&'a dyn SessionProvider<Session = T>),
}

/// Enumerate all items reachable from the strategy's current cursor
///
/// # Errors
///
/// Fails when the cursor cannot be turned into a URL or when a page count or
/// listing fetch fails. Items gathered up to that point are dropped with the
/// error; the cache keeps what was already fetched.
pub async fn discover<S, O>(
    strategy: &mut S,
    source: SessionSource<'_, S::Session>,
    observer: &mut O,
    stop: CancellationToken,
) -> CrawlResult<DiscoveryInfo>
where
    S: IndexStrategy,
    O: DiscoveryObserver,
{
    match source {
        SessionSource::Borrowed(session) => walk(strategy, session, observer, &stop).await,
        SessionSource::Launch(provider) => {
            let session = provider.open_session().await?;
            let result = walk(strategy, &session, observer, &stop).await;
            if let Err(e) = provider.close_session(session).await {
                warn!("Failed to close discovery session: {e}");
            }
            result
        }
    }
}

async fn walk<S, O>(
    strategy: &mut S,
    session: &S::Session,
    observer: &mut O,
    stop: &CancellationToken,
) -> CrawlResult<DiscoveryInfo>
where
    S: IndexStrategy,
    O: DiscoveryObserver,
{
    let initial_url = strategy.url().ok_or_else(|| unresolvable(strategy))?;
    let category = strategy.category().map(str::to_string);
    info!("Discovery '{}' starting at {initial_url}", strategy.name());

    let mut info = DiscoveryInfo {
        initial_url,
        available_pages: 0,
        start_page: strategy.page(),
        current_page: strategy.page(),
        start_category: category.clone(),
        current_category: category,
        items: Vec::new(),
    };
    info.available_pages = strategy.number_of_pages(session).await?;

    loop {
        while info.current_page <= info.available_pages && !stop.is_cancelled() {
            let items = strategy.links(session).await?;
            debug!(
                "{:?} page {}/{}: {} items",
                info.current_category,
                info.current_page,
                info.available_pages,
                items.len()
            );
            info.items.extend(items);

            observer.on_discover(&info, stop).await;
            if stop.is_cancelled() {
                break;
            }

            strategy.next_page();
            info.current_page = strategy.page();
        }

        if stop.is_cancelled() || !strategy.has_categories() {
            break;
        }

        strategy.next_category();
        info.current_category = strategy.category().map(str::to_string);
        let Some(category) = info.current_category.as_deref() else {
            break;
        };
        debug!("Moving to category {category}");

        if strategy.url().is_none() {
            return Err(unresolvable(strategy));
        }
        info.available_pages = strategy.number_of_pages(session).await?;
        info.current_page = strategy.page();
    }

    info!(
        "Discovery '{}' finished with {} items{}",
        strategy.name(),
        info.items.len(),
        if stop.is_cancelled() { " (stopped)" } else { "" }
    );
    Ok(info)
}

fn unresolvable<S: IndexStrategy>(strategy: &S) -> CrawlError {
    CrawlError::UnresolvableUrl {
        strategy: strategy.name().to_string(),
        category: strategy.category().map(str::to_string),
        page: strategy.page(),
    }
}
