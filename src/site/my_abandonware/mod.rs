//! myabandonware.com: a retro-games catalog browsable by name initial, year,
//! platform and genre, plus a filtered search

pub mod constants;
pub mod extractor;
pub mod js_scripts;
pub mod urls;

use std::sync::Arc;

pub use extractor::MyAbandonwareExtractor;
pub use urls::{SearchFilter, SiteScheme, StrategyKind};

use crate::cache::Cache;
use crate::error::CrawlResult;
use crate::extractor::PageExtractor;
use crate::index_page::IndexPage;

/// Index strategy of the catalog over any extractor
pub type CatalogIndex<E = MyAbandonwareExtractor> = IndexPage<SiteScheme, E>;

/// Build the strategy for `kind`, using `filter` when searching
///
/// # Errors
///
/// `Config` for an invalid search filter.
pub fn build_index<E: PageExtractor + 'static>(
    kind: StrategyKind,
    filter: SearchFilter,
    cache: Cache,
    extractor: Arc<E>,
) -> CrawlResult<CatalogIndex<E>> {
    let scheme = match kind {
        StrategyKind::Search => SiteScheme::search(filter)?,
        other => SiteScheme::category(other)?,
    };
    Ok(IndexPage::new(scheme, cache, extractor))
}
