//! A launched browser shared by the fetches of one crawl
//!
//! Pages are opened per fetch and closed afterwards, so one session serves
//! any number of concurrent extractions.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser_setup::launch_browser;

/// Upper bound for loading one page
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(45);

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Browser process, its CDP handler task and its throwaway profile
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserSession {
    /// Launch a browser with a fresh profile directory
    pub async fn launch(headless: bool) -> Result<Self> {
        let user_data_dir = std::env::temp_dir().join(format!(
            "catalog_crawler_chrome_{}_{}",
            std::process::id(),
            SESSION_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let (browser, handler, user_data_dir) = launch_browser(headless, user_data_dir).await?;

        Ok(Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        })
    }

    /// Open a new tab and load `url` in it
    pub async fn open_page(&self, url: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to create page")?;

        let load = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        match tokio::time::timeout(NAVIGATION_TIMEOUT, load).await {
            Ok(Ok(())) => {
                debug!("Loaded {url}");
                Ok(page)
            }
            Ok(Err(e)) => {
                close_page(page).await;
                Err(anyhow::anyhow!("Navigation to {url} failed: {e}"))
            }
            Err(_) => {
                close_page(page).await;
                Err(anyhow::anyhow!(
                    "Navigation to {url} timed out after {}s",
                    NAVIGATION_TIMEOUT.as_secs()
                ))
            }
        }
    }

    /// Close the browser, wait for the process to exit and remove its profile
    pub async fn close(mut self) -> Result<()> {
        debug!("Closing browser");
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {e}");
        }
        self.browser
            .wait()
            .await
            .context("Failed to wait for browser exit")?;
        self.handler.abort();
        self.remove_profile();
        info!("Browser session closed");
        Ok(())
    }

    fn remove_profile(&mut self) {
        if let Some(path) = self.user_data_dir.take()
            && let Err(e) = std::fs::remove_dir_all(&path)
        {
            warn!("Failed to remove profile {}: {e}", path.display());
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if self.user_data_dir.is_some() {
            warn!("BrowserSession dropped without close(), removing profile in Drop");
            self.remove_profile();
        }
    }
}

/// Close a tab, logging instead of failing
pub async fn close_page(page: Page) {
    if let Err(e) = page.close().await {
        debug!("Failed to close page: {e}");
    }
}
