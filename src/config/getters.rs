//! Getter methods for `Settings`

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{PathKind, Settings};
use crate::utils::constants::{INDEX_CACHE_FILE, ITEM_CACHE_FILE, ITEM_DATABASE_FILE};

impl Settings {
    #[must_use]
    pub fn internal_data_path(&self) -> &Path {
        &self.internal_data_path
    }

    #[must_use]
    pub fn item_info_path(&self) -> Option<&str> {
        self.item_info_path.as_deref()
    }

    #[must_use]
    pub fn item_downloads_path(&self) -> Option<&str> {
        self.item_downloads_path.as_deref()
    }

    #[must_use]
    pub fn item_screenshots_path(&self) -> Option<&str> {
        self.item_screenshots_path.as_deref()
    }

    /// Output path template for `kind`
    #[must_use]
    pub fn path_template(&self, kind: PathKind) -> Option<&str> {
        match kind {
            PathKind::ItemInfo => self.item_info_path(),
            PathKind::ItemDownloads => self.item_downloads_path(),
            PathKind::ItemScreenshots => self.item_screenshots_path(),
        }
    }

    #[must_use]
    pub fn cache_item_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_item_ttl_secs)
    }

    #[must_use]
    pub fn cache_index_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_index_ttl_secs)
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    #[must_use]
    pub fn index_cache_path(&self) -> PathBuf {
        self.internal_data_path.join(INDEX_CACHE_FILE)
    }

    #[must_use]
    pub fn item_cache_path(&self) -> PathBuf {
        self.internal_data_path.join(ITEM_CACHE_FILE)
    }

    #[must_use]
    pub fn item_database_path(&self) -> PathBuf {
        self.internal_data_path.join(ITEM_DATABASE_FILE)
    }
}
