//! Category/page cursor of an index traversal

use std::sync::Arc;

use crate::error::{CrawlError, CrawlResult};

/// Position inside an ordered, finite category list
///
/// The index may move one step past the last category; `category()` then
/// reports `None` and the traversal is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCursor {
    categories: Arc<[String]>,
    index: usize,
}

impl CategoryCursor {
    #[must_use]
    pub fn new(categories: Arc<[String]>) -> Self {
        Self {
            categories,
            index: 0,
        }
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.categories.get(self.index).map(String::as_str)
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    fn select(&mut self, category: &str) -> CrawlResult<()> {
        let index = self
            .categories
            .iter()
            .position(|c| c == category)
            .ok_or_else(|| CrawlError::UnknownCategory(category.to_string()))?;
        self.index = index;
        Ok(())
    }

    fn advance(&mut self) {
        self.index = (self.index + 1).min(self.categories.len());
    }
}

/// Minimal mutable state a traversal URL is derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalCursor {
    category: Option<CategoryCursor>,
    page: u32,
}

impl TraversalCursor {
    /// Cursor on page 1 of the first category, or of the only listing when
    /// `categories` is `None`
    #[must_use]
    pub fn new(categories: Option<Arc<[String]>>) -> Self {
        Self {
            category: categories.map(CategoryCursor::new),
            page: 1,
        }
    }

    #[must_use]
    pub fn has_categories(&self) -> bool {
        self.category.is_some()
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_ref().and_then(CategoryCursor::category)
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Jump to `category`, keeping the page
    ///
    /// # Errors
    ///
    /// `UnknownCategory` when `category` is not in the list, or when the
    /// cursor has no categories at all.
    pub fn set_category(&mut self, category: &str) -> CrawlResult<()> {
        match self.category.as_mut() {
            Some(cursor) => cursor.select(category),
            None => Err(CrawlError::UnknownCategory(category.to_string())),
        }
    }

    /// # Errors
    ///
    /// `InvalidPage` for page 0.
    pub fn set_page(&mut self, page: u32) -> CrawlResult<()> {
        if page == 0 {
            return Err(CrawlError::InvalidPage(page));
        }
        self.page = page;
        Ok(())
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    /// Move to page 1 of the next category
    ///
    /// Past the last category the cursor reports no category instead of
    /// failing. Without categories this does nothing.
    pub fn next_category(&mut self) {
        if let Some(cursor) = self.category.as_mut() {
            cursor.advance();
            self.page = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(names: &[&str]) -> Option<Arc<[String]>> {
        Some(names.iter().map(|s| (*s).to_string()).collect())
    }

    #[test]
    fn next_category_resets_page() {
        let mut cursor = TraversalCursor::new(categories(&["a", "b"]));
        cursor.set_page(4).unwrap();
        cursor.next_category();

        assert_eq!(cursor.category(), Some("b"));
        assert_eq!(cursor.page(), 1);
    }

    #[test]
    fn advancing_past_last_category_yields_none() {
        let mut cursor = TraversalCursor::new(categories(&["a"]));
        cursor.next_category();
        assert_eq!(cursor.category(), None);

        cursor.next_category();
        assert_eq!(cursor.category(), None);
        assert!(cursor.has_categories());
    }

    #[test]
    fn unknown_category_is_rejected_and_cursor_kept() {
        let mut cursor = TraversalCursor::new(categories(&["a", "b"]));
        cursor.set_category("b").unwrap();

        let err = cursor.set_category("zzz").unwrap_err();
        assert!(matches!(err, CrawlError::UnknownCategory(c) if c == "zzz"));
        assert_eq!(cursor.category(), Some("b"));
    }

    #[test]
    fn page_zero_is_invalid() {
        let mut cursor = TraversalCursor::new(None);
        assert!(matches!(cursor.set_page(0), Err(CrawlError::InvalidPage(0))));
        assert_eq!(cursor.page(), 1);
    }

    #[test]
    fn cursor_without_categories_ignores_next_category() {
        let mut cursor = TraversalCursor::new(None);
        cursor.next_page();
        cursor.next_category();

        assert!(!cursor.has_categories());
        assert_eq!(cursor.category(), None);
        assert_eq!(cursor.page(), 2);
    }
}
