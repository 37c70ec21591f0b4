//! Core settings types for catalog crawling
//!
//! This module contains the `Settings` struct that is loaded once at process
//! start and passed by reference into every component constructor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_DATA_PATH, DEFAULT_LOG_LEVEL, ONE_HOUR_SECS, ONE_WEEK_SECS,
};

/// Main settings struct for a crawler process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the caches and the item database.
    ///
    /// Supports `[app]` and `[cwd]` placeholders until the settings are
    /// resolved by the loader.
    #[serde(default = "default_data_path")]
    pub(crate) internal_data_path: PathBuf,

    /// Template for the JSON info file of an item
    #[serde(default)]
    pub(crate) item_info_path: Option<String>,

    /// Template for the folder receiving an item's downloads
    #[serde(default)]
    pub(crate) item_downloads_path: Option<String>,

    /// Template for the folder receiving an item's screenshots
    #[serde(default)]
    pub(crate) item_screenshots_path: Option<String>,

    /// Lifetime of cached item details
    ///
    /// Default: one week
    #[serde(default = "default_item_ttl")]
    pub(crate) cache_item_ttl_secs: u64,

    /// Lifetime of cached index listings and page counts
    ///
    /// Default: one hour
    #[serde(default = "default_index_ttl")]
    pub(crate) cache_index_ttl_secs: u64,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub(crate) headless: bool,

    /// Maximum item details fetched at the same time
    #[serde(default = "default_concurrency")]
    pub(crate) concurrency: usize,

    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub(crate) log_level: String,
}

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn default_item_ttl() -> u64 {
    ONE_WEEK_SECS
}

fn default_index_ttl() -> u64 {
    ONE_HOUR_SECS
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            internal_data_path: default_data_path(),
            item_info_path: None,
            item_downloads_path: None,
            item_screenshots_path: None,
            cache_item_ttl_secs: ONE_WEEK_SECS,
            cache_index_ttl_secs: ONE_HOUR_SECS,
            headless: true,
            concurrency: DEFAULT_CONCURRENCY,
            log_level: default_log_level(),
        }
    }
}

/// Kind of output path a template produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    ItemInfo,
    ItemDownloads,
    ItemScreenshots,
}
