//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Split text on whitespace into lowercase tokens with surrounding
/// punctuation removed. Empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Case-insensitive substring match in either direction.
///
/// Empty strings never match.
pub fn contains_either(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Whether `needle` shares any run of at least `min_len` characters with
/// `haystack` (case-insensitive).
pub fn shares_substring(needle: &str, haystack: &str, min_len: usize) -> bool {
    if min_len == 0 {
        return true;
    }
    let needle: Vec<char> = needle.to_lowercase().chars().collect();
    let haystack = haystack.to_lowercase();
    if needle.len() < min_len {
        return false;
    }
    needle
        .windows(min_len)
        .map(|w| w.iter().collect::<String>())
        .any(|window| !window.trim().is_empty() && haystack.contains(&window))
}
