//! Shared utility functions.
//!
//! ## JSON Extraction Helpers
//!
//! - `json_string` - Extract a string field
//! - `json_string_array` - Extract an array of strings, skipping non-strings

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract string from JSON value by key.
#[inline]
pub fn json_string(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(String::from)
}

/// Extract string array from JSON value by key.
#[inline]
pub fn json_string_array(value: &serde_json::Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|s| s.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// String Utilities
// =============================================================================

/// Capitalize the first character of a string.
#[inline]
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// First `max_chars` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("outline"), "Outline");
        assert_eq!(capitalize_first("écrivain"), "Écrivain");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("données", 4), "donn");
        assert_eq!(truncate_chars("été", 2), "ét");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_json_helpers() {
        let v = json!({"title": "Rapport", "warnings": ["a", 1, "b"]});
        assert_eq!(json_string(&v, "title").as_deref(), Some("Rapport"));
        assert_eq!(json_string(&v, "missing"), None);
        assert_eq!(json_string_array(&v, "warnings"), vec!["a", "b"]);
    }
}
