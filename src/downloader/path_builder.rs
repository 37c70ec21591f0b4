//! Output paths from settings templates
//!
//! Templates may contain `[name]`, `[platform]`, `[year]`, `[genre]` and
//! `[publisher]`, matched case-insensitively. Substituted values are
//! sanitized so an item name can never add path components.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::schema::ItemDetail;
use crate::utils::replace_placeholder;

const PLACEHOLDERS: [&str; 5] = ["name", "platform", "year", "genre", "publisher"];

/// Values substituted into a template for one item
#[derive(Debug, Clone, Default)]
pub struct PathValues {
    values: BTreeMap<&'static str, String>,
}

impl PathValues {
    /// Values taken from the item's own fields and metadata
    #[must_use]
    pub fn from_detail(detail: &ItemDetail) -> Self {
        let mut values = BTreeMap::new();
        values.insert("name", detail.name.clone().unwrap_or_default());
        values.insert(
            "platform",
            detail
                .platform
                .clone()
                .or_else(|| detail.meta.get("platform").cloned())
                .unwrap_or_default(),
        );
        values.insert(
            "year",
            detail.year.map(|y| y.to_string()).unwrap_or_default(),
        );
        for key in ["genre", "publisher"] {
            values.insert(key, detail.meta.get(key).cloned().unwrap_or_default());
        }
        Self { values }
    }

    /// Override `key` when `value` is present
    #[must_use]
    pub fn with(mut self, key: &str, value: Option<&str>) -> Self {
        if let (Some(slot), Some(value)) = (
            PLACEHOLDERS.iter().find(|p| **p == key),
            value.filter(|v| !v.is_empty()),
        ) {
            self.values.insert(*slot, value.to_string());
        }
        self
    }

    /// Substitute every placeholder of `template`
    #[must_use]
    pub fn build(&self, template: &str) -> PathBuf {
        let path = PLACEHOLDERS.iter().fold(template.to_string(), |acc, key| {
            let value = self.values.get(key).map(String::as_str).unwrap_or_default();
            replace_placeholder(&acc, &format!("[{key}]"), &sanitize_filename::sanitize(value))
        });
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doom() -> ItemDetail {
        let mut detail = ItemDetail::new("https://www.myabandonware.com/game/doom-1");
        detail.name = Some("Doom: Episode 1/2".to_string());
        detail.platform = Some("DOS".to_string());
        detail.year = Some(1993);
        detail.meta.insert("genre".to_string(), "Action".to_string());
        detail
    }

    #[test]
    fn template_values_are_substituted_and_sanitized() {
        let path = PathValues::from_detail(&doom()).build("/games/[Platform]/[year]/[name]");
        assert_eq!(path, PathBuf::from("/games/DOS/1993/Doom Episode 12"));
    }

    #[test]
    fn missing_values_become_empty() {
        let path = PathValues::from_detail(&doom()).build("/games/[publisher]/[genre]");
        assert_eq!(path, PathBuf::from("/games//Action"));
    }

    #[test]
    fn overrides_replace_item_values() {
        let path = PathValues::from_detail(&doom())
            .with("platform", Some("Windows"))
            .with("genre", None)
            .build("[platform]-[genre]");
        assert_eq!(path, PathBuf::from("Windows-Action"));
    }
}
