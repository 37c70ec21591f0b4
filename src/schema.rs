//! Value types produced by discovery and detail extraction.
//!
//! These are plain serde structs: they travel through the cache as JSON and
//! are written to the item repository by the persistence layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A discovered item on an index page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReference {
    /// Absolute URL of the item's detail page
    pub url: String,
    /// Title shown in the listing, when the listing carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ItemReference {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A remote file and, once downloaded, where it lives locally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub remote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
}

impl RemoteFile {
    #[must_use]
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            local: None,
        }
    }
}

/// One downloadable release of an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub url: RemoteFile,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

/// Full detail record of an item
///
/// Every field except `page_url` and `updated` is best-effort: a field the
/// extractor could not read stays empty and the record is still valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub page_url: String,
    /// Extraction time, milliseconds since epoch
    pub updated: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub votes: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub play_online_link: Option<String>,
    #[serde(default)]
    pub download_links: Vec<DownloadLink>,
    /// Screenshots grouped by platform name
    #[serde(default)]
    pub screenshots: BTreeMap<String, Vec<RemoteFile>>,
    #[serde(default)]
    pub how_to: Option<String>,
}

impl ItemDetail {
    /// Empty record for `page_url`, stamped with the current time
    #[must_use]
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            updated: chrono::Utc::now().timestamp_millis(),
            ..Self::default()
        }
    }
}
