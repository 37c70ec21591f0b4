//! Type-safe builder for `Settings` using the typestate pattern
//!
//! The data path is required before `build()` becomes reachable; everything
//! else starts from the same defaults the settings file loader uses.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::Settings;
use crate::error::{CrawlError, CrawlResult};

// Type states for the builder
pub struct WithDataPath;

pub struct SettingsBuilder<State = ()> {
    pub(crate) settings: Settings,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for SettingsBuilder<()> {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            _phantom: PhantomData,
        }
    }
}

impl Settings {
    /// Create a builder for configuring `Settings` with a fluent interface
    #[must_use]
    pub fn builder() -> SettingsBuilder<()> {
        SettingsBuilder::default()
    }
}

impl SettingsBuilder<()> {
    pub fn internal_data_path(self, dir: impl Into<PathBuf>) -> SettingsBuilder<WithDataPath> {
        let mut settings = self.settings;
        settings.internal_data_path = dir.into();
        SettingsBuilder {
            settings,
            _phantom: PhantomData,
        }
    }
}

impl<State> SettingsBuilder<State> {
    #[must_use]
    pub fn item_info_path(mut self, template: impl Into<String>) -> Self {
        self.settings.item_info_path = Some(template.into());
        self
    }

    #[must_use]
    pub fn item_downloads_path(mut self, template: impl Into<String>) -> Self {
        self.settings.item_downloads_path = Some(template.into());
        self
    }

    #[must_use]
    pub fn item_screenshots_path(mut self, template: impl Into<String>) -> Self {
        self.settings.item_screenshots_path = Some(template.into());
        self
    }

    #[must_use]
    pub fn cache_item_ttl_secs(mut self, secs: u64) -> Self {
        self.settings.cache_item_ttl_secs = secs;
        self
    }

    #[must_use]
    pub fn cache_index_ttl_secs(mut self, secs: u64) -> Self {
        self.settings.cache_index_ttl_secs = secs;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.settings.headless = headless;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.settings.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.settings.log_level = level.into();
        self
    }
}

impl SettingsBuilder<WithDataPath> {
    /// Validate and produce the settings
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Config` when concurrency is zero.
    pub fn build(self) -> CrawlResult<Settings> {
        if self.settings.concurrency == 0 {
            return Err(CrawlError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(self.settings)
    }
}
