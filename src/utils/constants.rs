//! Shared configuration constants for the catalog crawler
//!
//! This module contains default values used throughout the codebase to
//! ensure consistency and avoid magic numbers.

/// One hour, default lifetime of cached index listings and page counts
///
/// Listings shift as items are added to the catalog, so they go stale fast.
pub const ONE_HOUR_SECS: u64 = 3600;

/// One week, default lifetime of cached item details
pub const ONE_WEEK_SECS: u64 = 3600 * 24 * 7;

/// Default number of item details fetched at the same time
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Default location of caches and the item database
pub const DEFAULT_DATA_PATH: &str = "[app]/../.catalog-crawler";

/// Settings file used when `--config` is absent or unresolvable
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_LEVEL: &str = "error";

/// Cache file for listings and page counts
pub const INDEX_CACHE_FILE: &str = "cache-index.db";

/// Cache file for item details
pub const ITEM_CACHE_FILE: &str = "cache-item.db";

/// Item database file
pub const ITEM_DATABASE_FILE: &str = "data.db";

/// Chrome user agent string used for both the browser and plain downloads
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
