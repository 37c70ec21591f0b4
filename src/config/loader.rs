//! Settings file loading and validation
//!
//! Settings are read from a JSON file, checked for required keys and have
//! their `[app]` / `[cwd]` placeholders expanded into real directories.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::types::Settings;
use crate::error::{CrawlError, CrawlResult};
use crate::utils::constants::DEFAULT_SETTINGS_FILE;
use crate::utils::replace_placeholder;

/// Directories substituted for the path placeholders
#[derive(Debug, Clone)]
pub struct PathContext {
    /// Replaces `[app]`: directory of the running executable
    pub app_dir: PathBuf,
    /// Replaces `[cwd]`: working directory of the process
    pub cwd: PathBuf,
}

impl PathContext {
    /// Context of the running process
    pub fn current() -> CrawlResult<Self> {
        let exe = std::env::current_exe()?;
        let app_dir = exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            app_dir,
            cwd: std::env::current_dir()?,
        })
    }

    fn expand(&self, value: &str) -> String {
        let app = self.app_dir.to_string_lossy();
        let cwd = self.cwd.to_string_lossy();
        replace_placeholder(&replace_placeholder(value, "[app]", &app), "[cwd]", &cwd)
    }
}

/// Locate the settings file
///
/// A `--config` value is tried as given, then relative to the working
/// directory, then relative to the executable. Without a usable value the
/// default `settings.json` next to the executable is used.
#[must_use]
pub fn resolve_settings_path(requested: Option<&Path>, ctx: &PathContext) -> PathBuf {
    if let Some(requested) = requested {
        let candidates = [
            requested.to_path_buf(),
            ctx.cwd.join(requested),
            ctx.app_dir.join(requested),
        ];
        if let Some(found) = candidates.into_iter().find(|p| p.exists()) {
            return found;
        }
        warn!("Can't find settings file in {}", requested.display());
    }

    ctx.app_dir.join(DEFAULT_SETTINGS_FILE)
}

/// Check required keys and expand placeholders in every path setting
///
/// # Errors
///
/// Returns `CrawlError::Config` listing every missing required key.
pub fn validate_settings(mut settings: Settings, ctx: &PathContext) -> CrawlResult<Settings> {
    let required = [
        ("item_info_path", settings.item_info_path.is_none()),
        ("item_downloads_path", settings.item_downloads_path.is_none()),
        ("item_screenshots_path", settings.item_screenshots_path.is_none()),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(key, _)| *key)
        .collect();
    if !missing.is_empty() {
        return Err(CrawlError::Config(format!(
            "Missing settings for: [{}]",
            missing.join(", ")
        )));
    }
    if settings.concurrency == 0 {
        return Err(CrawlError::Config(
            "concurrency must be at least 1".to_string(),
        ));
    }

    settings.internal_data_path =
        PathBuf::from(ctx.expand(&settings.internal_data_path.to_string_lossy()));
    for template in [
        &mut settings.item_info_path,
        &mut settings.item_downloads_path,
        &mut settings.item_screenshots_path,
    ]
    .into_iter()
    .flatten()
    {
        *template = ctx.expand(template);
    }

    Ok(settings)
}

/// Read, parse and validate the settings file at `path`
pub async fn load_settings(path: &Path, ctx: &PathContext) -> CrawlResult<Settings> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        CrawlError::Config(format!("Failed to read settings {}: {e}", path.display()))
    })?;
    let settings: Settings = serde_json::from_str(&raw)?;
    let settings = validate_settings(settings, ctx)?;
    debug!("Settings loaded from {}", path.display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PathContext {
        PathContext {
            app_dir: PathBuf::from("/opt/crawler/bin"),
            cwd: PathBuf::from("/home/user"),
        }
    }

    #[test]
    fn placeholders_are_case_insensitive() {
        assert_eq!(
            ctx().expand("[APP]/../data/[cwd]"),
            "/opt/crawler/bin/../data//home/user"
        );
    }

    #[test]
    fn missing_required_keys_are_all_reported() {
        let settings: Settings =
            serde_json::from_str(r#"{ "item_info_path": "/tmp/[name].json" }"#).unwrap();
        let err = validate_settings(settings, &ctx()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("item_downloads_path"));
        assert!(msg.contains("item_screenshots_path"));
        assert!(!msg.contains("item_info_path"));
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "item_info_path": "[cwd]/info/[name].json",
                "item_downloads_path": "[cwd]/dl/[platform]",
                "item_screenshots_path": "[cwd]/shots/[name]"
            }"#,
        )
        .unwrap();
        let settings = validate_settings(settings, &ctx()).unwrap();

        assert_eq!(settings.cache_index_ttl_secs, 3600);
        assert_eq!(settings.cache_item_ttl_secs, 3600 * 24 * 7);
        assert_eq!(
            settings.internal_data_path,
            PathBuf::from("/opt/crawler/bin/../.catalog-crawler")
        );
        assert_eq!(
            settings.item_info_path.as_deref(),
            Some("/home/user/info/[name].json")
        );
    }

    #[test]
    fn unknown_config_path_falls_back_to_default() {
        let path = resolve_settings_path(Some(Path::new("/nonexistent/settings.json")), &ctx());
        assert_eq!(path, PathBuf::from("/opt/crawler/bin/settings.json"));
    }
}
