//! Glob matching for config value lists
//!
//! `*` matches any run of characters (including none). Patterns are anchored
//! at both ends, so `STRIPPED_*` matches `STRIPPED_OAK_LOG` but not `OAK_LOG`.

pub const WILDCARD: &str = "*";

pub fn is_pattern(value: &str) -> bool {
    value.contains('*')
}

pub fn matches(pattern: &str, text: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or("");
    if !text.starts_with(first) {
        return false;
    }
    let mut rest = &text[first.len()..];

    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // no star at all
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }

    rest.len() >= last.len() && rest.ends_with(last)
}

/// True if any pattern in `patterns` matches `text`.
pub fn matches_any<'a>(patterns: impl IntoIterator<Item = &'a str>, text: &str) -> bool {
    patterns.into_iter().any(|p| matches(p, text))
}
