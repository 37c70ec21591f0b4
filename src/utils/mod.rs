pub mod constants;

pub use constants::*;

/// Current time in milliseconds since the Unix epoch
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Replace every occurrence of `placeholder`, ignoring ASCII case
#[must_use]
pub fn replace_placeholder(value: &str, placeholder: &str, replacement: &str) -> String {
    let lower = value.to_ascii_lowercase();
    let placeholder = placeholder.to_ascii_lowercase();
    let mut result = String::with_capacity(value.len());
    let mut last = 0;
    for (idx, _) in lower.match_indices(&placeholder) {
        result.push_str(&value[last..idx]);
        result.push_str(replacement);
        last = idx + placeholder.len();
    }
    result.push_str(&value[last..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_replacement_ignores_case() {
        assert_eq!(
            replace_placeholder("/x/[Name]/[NAME].json", "[name]", "doom"),
            "/x/doom/doom.json"
        );
        assert_eq!(replace_placeholder("/plain", "[name]", "doom"), "/plain");
    }
}
