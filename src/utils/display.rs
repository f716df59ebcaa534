//! Width-aware text helpers for terminal output.

use unicode_width::UnicodeWidthChar;

const ELLIPSIS: &str = "...";

/// Truncate text so its display width fits in `max_width` columns.
///
/// Wide characters count for their terminal width. When truncation happens
/// the result ends with `...`, which is included in the width budget.
///
/// # Examples
///
/// ```
/// use study_search::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let total: usize = text.chars().map(char_width).sum();
    if total <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(ELLIPSIS.len());
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = char_width(c);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }

    out.push_str(ELLIPSIS);
    out
}

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_with_ellipsis_basic() {
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("Hello", 5), "Hello");
    }

    #[test]
    fn test_truncate_with_ellipsis_empty() {
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("anything", 0), "");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // each CJK character is two columns wide
        assert_eq!(truncate_with_ellipsis("記憶と恐怖の研究", 9), "記憶と...");
    }
}
