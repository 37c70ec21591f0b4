//! Downloads of item files: info JSON, screenshots and download links
//!
//! Files that already exist locally are not fetched again. Every resolved
//! local path is written into the `ItemDetail`, so the caller can store the
//! updated record.

pub mod path_builder;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use futures::StreamExt;
use reqwest::Client;
use reqwest::header::REFERER;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::{PathKind, Settings};
use crate::error::{CrawlError, CrawlResult};
use crate::schema::{ItemDetail, RemoteFile};
use crate::utils::constants::CHROME_USER_AGENT;

pub use path_builder::PathValues;

/// Which parts of an item `download_item` stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOptions {
    pub info: bool,
    pub downloads: bool,
    pub screenshots: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            info: true,
            downloads: true,
            screenshots: true,
        }
    }
}

/// Outcome counts of one `download_item` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// HTTP downloader with a cookie jar shared by every request
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    info_template: String,
    downloads_template: String,
    screenshots_template: String,
}

impl Downloader {
    /// # Errors
    ///
    /// `Config` when a path template is missing, `Download` when the HTTP
    /// client cannot be built.
    pub fn new(settings: &Settings) -> CrawlResult<Self> {
        let template = |kind: PathKind| {
            settings
                .path_template(kind)
                .map(str::to_string)
                .ok_or_else(|| CrawlError::Config(format!("Missing path template for {kind:?}")))
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(CHROME_USER_AGENT)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| CrawlError::Download(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            info_template: template(PathKind::ItemInfo)?,
            downloads_template: template(PathKind::ItemDownloads)?,
            screenshots_template: template(PathKind::ItemScreenshots)?,
        })
    }

    /// Store the parts of `detail` selected by `options`
    ///
    /// Individual file failures are logged and counted; they never abort the
    /// remaining files.
    pub async fn download_item(
        &self,
        detail: &mut ItemDetail,
        options: DownloadOptions,
    ) -> DownloadReport {
        let mut report = DownloadReport::default();
        info!(
            "Downloading {}",
            detail.name.as_deref().unwrap_or(&detail.page_url)
        );

        if options.downloads && !detail.download_links.is_empty() {
            // Page visit fills the cookie jar the download links expect
            if let Err(e) = self.client.get(&detail.page_url).send().await {
                warn!("Failed to load cookies from {}: {e}", detail.page_url);
            }

            let base = PathValues::from_detail(detail);
            let page_url = detail.page_url.clone();
            for link in &mut detail.download_links {
                let mut values = base.clone().with("platform", link.platform.as_deref());
                for (key, value) in &link.meta {
                    values = values.with(key, Some(value.as_str()));
                }
                let dir = values.build(&self.downloads_template);
                self.fetch_into(&mut link.url, &dir, Some(&page_url), &mut report)
                    .await;
            }
        }

        if options.screenshots {
            let base = PathValues::from_detail(detail);
            for (platform, files) in &mut detail.screenshots {
                let dir = base
                    .clone()
                    .with("platform", Some(platform.as_str()))
                    .build(&self.screenshots_template);
                for file in files {
                    self.fetch_into(file, &dir, None, &mut report).await;
                }
            }
        }

        if options.info {
            match self.write_info(detail).await {
                Ok(path) => debug!("Wrote {}", path.display()),
                Err(e) => {
                    warn!("Failed to write info of {}: {e}", detail.page_url);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Write `detail` as pretty JSON to its info path
    pub async fn write_info(&self, detail: &ItemDetail) -> CrawlResult<PathBuf> {
        let path = PathValues::from_detail(detail).build(&self.info_template);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(detail)?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }

    async fn fetch_into(
        &self,
        file: &mut RemoteFile,
        dir: &Path,
        referer: Option<&str>,
        report: &mut DownloadReport,
    ) {
        if let Some(local) = file.local.as_deref()
            && Path::new(local).exists()
        {
            debug!("Already downloaded: {local}");
            report.skipped += 1;
            return;
        }

        match self.download_file(&file.remote, dir, referer).await {
            Ok(path) => {
                file.local = Some(path.to_string_lossy().into_owned());
                report.downloaded += 1;
            }
            Err(e) => {
                warn!("Download of {} failed: {e:#}", file.remote);
                report.failed += 1;
            }
        }
    }

    /// Fetch `url` into `dir`, named after the final URL's last path segment
    ///
    /// An existing file of the same name is kept and its path returned.
    pub async fn download_file(
        &self,
        url: &str,
        dir: &Path,
        referer: Option<&str>,
    ) -> anyhow::Result<PathBuf> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to request {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("{url} answered with status {}", response.status());
        }

        let file_name = response
            .url()
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(sanitize_filename::sanitize)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "download".to_string());

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(&file_name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!("Keeping existing {}", path.display());
            return Ok(path);
        }

        let partial = dir.join(format!("{file_name}.part"));
        let mut output = tokio::fs::File::create(&partial)
            .await
            .with_context(|| format!("Failed to create {}", partial.display()))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed to read response body")?;
            output.write_all(&chunk).await?;
        }
        output.flush().await?;
        drop(output);

        tokio::fs::rename(&partial, &path).await?;
        debug!("Downloaded {url} => {}", path.display());
        Ok(path)
    }
}
