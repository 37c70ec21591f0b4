//! Browser-driven extraction of listings and item details
//!
//! Each detail field is read by its own script. A field that fails is logged
//! and left empty; the rest of the record is still returned.

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::js_scripts::{
    DESCRIPTION_SCRIPT, DOWNLOAD_LINKS_SCRIPT, ITEM_LINKS_SCRIPT, META_SCRIPT, NAME_SCRIPT,
    PAGE_COUNT_SCRIPT, PLAY_ONLINE_SCRIPT, SCORE_SCRIPT, SCREENSHOTS_SCRIPT,
};
use crate::browser_session::{BrowserSession, close_page};
use crate::error::{CrawlError, CrawlResult};
use crate::extractor::{PageExtractor, SessionProvider};
use crate::schema::{DownloadLink, ItemDetail, ItemReference, RemoteFile};

/// Raw download link as returned by the page script
#[derive(Debug, serde::Deserialize)]
struct ScriptLink {
    url: String,
    platform: Option<String>,
    info: Option<String>,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    meta: BTreeMap<String, String>,
}

impl From<ScriptLink> for DownloadLink {
    fn from(link: ScriptLink) -> Self {
        Self {
            url: RemoteFile::new(link.url),
            year: None,
            platform: link.platform,
            info: link.info,
            languages: link.languages,
            meta: link.meta,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MyAbandonwareExtractor {
    headless: bool,
}

impl MyAbandonwareExtractor {
    #[must_use]
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

async fn evaluate<T: DeserializeOwned>(page: &Page, script: &str) -> anyhow::Result<T> {
    let result = page.evaluate(script).await?;
    Ok(result.into_value()?)
}

/// Run `script` on a freshly opened page and close it again
async fn with_page<T: DeserializeOwned>(
    session: &BrowserSession,
    url: &str,
    script: &str,
) -> CrawlResult<T> {
    let page = session
        .open_page(url)
        .await
        .map_err(|e| CrawlError::Browser(format!("{e:#}")))?;
    let value = evaluate(&page, script).await;
    close_page(page).await;
    value.map_err(|e| CrawlError::Extraction(format!("{url}: {e:#}")))
}

/// Log a failed field and turn it into "absent"
fn field<T>(name: &str, url: &str, result: anyhow::Result<Option<T>>) -> Option<T> {
    match result {
        Ok(value) => {
            if value.is_none() {
                debug!("{name} not present on {url}");
            }
            value
        }
        Err(e) => {
            warn!("{name} not available for {url}: {e:#}");
            None
        }
    }
}

/// `Developed by:` → `developedBy`
fn meta_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    let words = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty());
    for (i, word) in words.enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            key.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                key.extend(first.to_uppercase());
                key.push_str(chars.as_str());
            }
        }
    }
    key
}

/// Fold the info table into the detail record
fn apply_meta(detail: &mut ItemDetail, rows: Vec<(String, String)>) {
    for (label, value) in rows {
        match meta_key(&label).as_str() {
            "" => {}
            "platform" => detail.platform = Some(value),
            "year" => match value.trim().parse() {
                Ok(year) => detail.year = Some(year),
                Err(_) => {
                    detail.meta.insert("year".to_string(), value);
                }
            },
            key => {
                detail.meta.insert(key.to_string(), value);
            }
        }
    }
}

/// Displayed score and vote count, e.g. `("4.52", "1,024")`
fn parse_score(score: &str, votes: &str) -> (Option<f64>, Option<u32>) {
    let votes: String = votes.chars().filter(char::is_ascii_digit).collect();
    (score.trim().parse().ok(), votes.parse().ok())
}

#[async_trait]
impl SessionProvider for MyAbandonwareExtractor {
    type Session = BrowserSession;

    async fn open_session(&self) -> CrawlResult<BrowserSession> {
        BrowserSession::launch(self.headless)
            .await
            .map_err(|e| CrawlError::Browser(format!("{e:#}")))
    }

    async fn close_session(&self, session: BrowserSession) -> CrawlResult<()> {
        session
            .close()
            .await
            .map_err(|e| CrawlError::Browser(format!("{e:#}")))
    }
}

#[async_trait]
impl PageExtractor for MyAbandonwareExtractor {
    async fn fetch_page_count(&self, session: &BrowserSession, url: &str) -> CrawlResult<u32> {
        info!("fetch_page_count({url})");
        let count: Option<u32> = with_page(session, url, PAGE_COUNT_SCRIPT).await?;
        Ok(count.unwrap_or_default())
    }

    async fn fetch_page_items(
        &self,
        session: &BrowserSession,
        url: &str,
    ) -> CrawlResult<Vec<ItemReference>> {
        info!("fetch_page_items({url})");
        let items: Option<Vec<ItemReference>> = with_page(session, url, ITEM_LINKS_SCRIPT).await?;
        Ok(items.unwrap_or_default())
    }

    async fn fetch_item_detail(
        &self,
        session: &BrowserSession,
        url: &str,
    ) -> CrawlResult<ItemDetail> {
        info!("fetch_item_detail({url})");
        let page = session
            .open_page(url)
            .await
            .map_err(|e| CrawlError::Browser(format!("{e:#}")))?;

        let (name, meta, score, play_online, screenshots, description, links) = tokio::join!(
            evaluate::<Option<String>>(&page, NAME_SCRIPT),
            evaluate::<Option<Vec<(String, String)>>>(&page, META_SCRIPT),
            evaluate::<Option<(String, String)>>(&page, SCORE_SCRIPT),
            evaluate::<Option<String>>(&page, PLAY_ONLINE_SCRIPT),
            evaluate::<Option<BTreeMap<String, Vec<String>>>>(&page, SCREENSHOTS_SCRIPT),
            evaluate::<Option<String>>(&page, DESCRIPTION_SCRIPT),
            evaluate::<Option<Vec<ScriptLink>>>(&page, DOWNLOAD_LINKS_SCRIPT),
        );
        close_page(page).await;

        let mut detail = ItemDetail::new(url);
        detail.name = field("name", url, name);
        if let Some(rows) = field("meta", url, meta) {
            apply_meta(&mut detail, rows);
        }
        if let Some((score, votes)) = field("score", url, score) {
            (detail.score, detail.votes) = parse_score(&score, &votes);
        }
        detail.play_online_link = field("play online link", url, play_online);
        detail.screenshots = field("screenshots", url, screenshots)
            .unwrap_or_default()
            .into_iter()
            .map(|(platform, urls)| (platform, urls.into_iter().map(RemoteFile::new).collect()))
            .collect();
        detail.description = field("description", url, description);
        detail.download_links = field("download links", url, links)
            .unwrap_or_default()
            .into_iter()
            .map(DownloadLink::from)
            .collect();

        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_labels_become_camel_case() {
        assert_eq!(meta_key("Platform"), "platform");
        assert_eq!(meta_key("Developed by:"), "developedBy");
        assert_eq!(meta_key("  Also  Released On "), "alsoReleasedOn");
        assert_eq!(meta_key(":"), "");
    }

    #[test]
    fn meta_rows_fill_platform_and_year() {
        let mut detail = ItemDetail::new("https://www.myabandonware.com/game/doom-1");
        apply_meta(
            &mut detail,
            vec![
                ("Platform".to_string(), "DOS".to_string()),
                ("Year".to_string(), "1993".to_string()),
                ("Genre".to_string(), "Action".to_string()),
            ],
        );

        assert_eq!(detail.platform.as_deref(), Some("DOS"));
        assert_eq!(detail.year, Some(1993));
        assert_eq!(detail.meta.get("genre").map(String::as_str), Some("Action"));
        assert!(!detail.meta.contains_key("platform"));
    }

    #[test]
    fn score_tolerates_separators() {
        assert_eq!(parse_score("4.52", "1,024"), (Some(4.52), Some(1024)));
        assert_eq!(parse_score("n/a", ""), (None, None));
    }

    #[test]
    fn failed_field_is_absent() {
        let failed: anyhow::Result<Option<String>> = Err(anyhow::anyhow!("selector timeout"));
        assert_eq!(field("name", "u", failed), None);
        assert_eq!(field("name", "u", Ok(Some(1))), Some(1));
    }
}
