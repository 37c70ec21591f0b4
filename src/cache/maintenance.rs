//! Inspection and upkeep of the crawler's cache databases

use std::time::Duration;

use tracing::info;

use super::{Cache, CacheOptions, KeyFilter, PurgeStats};
use crate::config::Settings;
use crate::error::CrawlResult;

/// List keys of the index cache without touching any entry
///
/// Opened with zero ttl and cleaning disabled, so expired keys are reported
/// as they are.
pub async fn index_cache_keys(settings: &Settings, filter: KeyFilter) -> CrawlResult<Vec<String>> {
    let cache = Cache::open(
        CacheOptions::new(settings.index_cache_path(), Duration::ZERO).clean_expired(false),
    )
    .await?;
    let keys = cache.keys(filter).await;
    cache.close().await;
    keys
}

/// Re-stamp every valid entry of both caches with its configured ttl
///
/// Returns the number of extended entries per cache as (index, item).
pub async fn extend_cache_lifetime(settings: &Settings) -> CrawlResult<(u64, u64)> {
    let index = Cache::open(CacheOptions::new(
        settings.index_cache_path(),
        settings.cache_index_ttl(),
    ))
    .await?;
    let item = Cache::open(CacheOptions::new(
        settings.item_cache_path(),
        settings.cache_item_ttl(),
    ))
    .await?;

    let index_count = index.extend_lifetime().await?;
    let item_count = item.extend_lifetime().await?;
    index.close().await;
    item.close().await;

    info!("Extended {index_count} index and {item_count} item cache entries");
    Ok((index_count, item_count))
}

/// Purge expired entries from both caches
pub async fn purge_caches(settings: &Settings) -> CrawlResult<(PurgeStats, PurgeStats)> {
    let index = Cache::open(CacheOptions::new(
        settings.index_cache_path(),
        settings.cache_index_ttl(),
    ))
    .await?;
    let item = Cache::open(CacheOptions::new(
        settings.item_cache_path(),
        settings.cache_item_ttl(),
    ))
    .await?;

    let index_stats = index.purge().await?;
    let item_stats = item.purge().await?;
    index.close().await;
    item.close().await;

    info!(
        "Purged {}/{} index and {}/{} item cache entries",
        index_stats.removed, index_stats.existing, item_stats.removed, item_stats.existing
    );
    Ok((index_stats, item_stats))
}
