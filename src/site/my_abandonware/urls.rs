//! Listing URLs of the catalog
//!
//! Category listings live at `/browse/{kind}/{category}/` with `page/{n}/`
//! appended after the first page. Search listings encode the filter as path
//! segments under `/search`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use super::constants::{
    BASE_URL, FIRST_YEAR, GENRES, LAST_YEAR, NAME_INITIALS, PLATFORMS, platform_id,
};
use crate::error::{CrawlError, CrawlResult};
use crate::index_page::UrlScheme;

/// Traversal strategies offered by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyKind {
    Name,
    Year,
    Platform,
    Genre,
    Search,
}

impl StrategyKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Year => "year",
            Self::Platform => "platform",
            Self::Genre => "genre",
            Self::Search => "search",
        }
    }

    /// Ordered categories of the strategy, `None` for search
    #[must_use]
    pub fn categories(self) -> Option<Arc<[String]>> {
        match self {
            Self::Name => Some(NAME_INITIALS.chars().map(String::from).collect()),
            Self::Year => Some((FIRST_YEAR..=LAST_YEAR).map(|y| y.to_string()).collect()),
            Self::Platform => Some(PLATFORMS.iter().map(|p| (*p).to_string()).collect()),
            Self::Genre => Some(GENRES.iter().map(|g| (*g).to_string()).collect()),
            Self::Search => None,
        }
    }
}

/// Filter of a search listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub name: Option<String>,
    pub platform: Option<String>,
    pub year: Option<u16>,
    /// Minimum rating, e.g. 4.5
    pub rating: Option<f32>,
}

/// URL scheme of one catalog strategy
#[derive(Debug, Clone)]
pub struct SiteScheme {
    kind: StrategyKind,
    filter: SearchFilter,
    categories: Option<Arc<[String]>>,
}

impl SiteScheme {
    /// Scheme walking the categories of `kind`
    ///
    /// # Errors
    ///
    /// `Config` when `kind` is `Search`, which needs a filter.
    pub fn category(kind: StrategyKind) -> CrawlResult<Self> {
        if kind == StrategyKind::Search {
            return Err(CrawlError::Config(
                "search strategy needs a filter".to_string(),
            ));
        }
        Ok(Self {
            kind,
            filter: SearchFilter::default(),
            categories: kind.categories(),
        })
    }

    /// Scheme walking the results of a search
    ///
    /// # Errors
    ///
    /// `Config` for a platform without a search id.
    pub fn search(filter: SearchFilter) -> CrawlResult<Self> {
        if let Some(platform) = filter.platform.as_deref()
            && platform_id(platform).is_none()
        {
            return Err(CrawlError::Config(format!("Unknown platform '{platform}'")));
        }
        Ok(Self {
            kind: StrategyKind::Search,
            filter,
            categories: None,
        })
    }

    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn category_url(&self, category: &str, page: u32) -> String {
        let mut url = format!("{BASE_URL}/browse/{}/{category}/", self.kind.as_str());
        if page > 1 {
            url.push_str(&format!("page/{page}/"));
        }
        url
    }

    fn search_url(&self, page: u32) -> Option<String> {
        let mut url = Url::parse(BASE_URL).ok()?;
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments.clear().push("search");
            if let Some(name) = self.filter.name.as_deref() {
                segments.push("q").push(name);
            }
            if let Some(platform) = self.filter.platform.as_deref() {
                segments.push("pla").push(&platform_id(platform)?.to_string());
            }
            if let Some(year) = self.filter.year {
                segments.push("y").push(&year.to_string());
            }
            if let Some(rating) = self.filter.rating {
                segments.push("rt").push(&rating_segment(rating));
            }
            if page > 1 {
                segments.push("page").push(&page.to_string()).push("");
            }
        }
        Some(url.into())
    }
}

/// Rating as the site encodes it: digits without the dot, at least two
fn rating_segment(rating: f32) -> String {
    let digits = rating.to_string().replace('.', "");
    format!("{digits:0<2}")
}

impl UrlScheme for SiteScheme {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn categories(&self) -> Option<Arc<[String]>> {
        self.categories.clone()
    }

    fn build_url(&self, category: Option<&str>, page: u32) -> Option<String> {
        match (self.kind, category) {
            (StrategyKind::Search, _) => self.search_url(page),
            (_, Some(category)) => Some(self.category_url(category, page)),
            (_, None) => None,
        }
    }
}
