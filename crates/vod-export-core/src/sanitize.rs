//! Title and path-component sanitation.
//!
//! Everything here is pure string-to-string: illegal path characters are
//! stripped, over-long components are shortened to an exact bound, and
//! release-group noise (quality tags, trailing years) is scrubbed from
//! display titles before they become folder names.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Quality/language vocabulary stripped from titles.
const TAG_WORDS: &str = r"\d{3,4}p|4K|UHD|FHD|HD|SD|ENG|EN|DUAL|MULTI-AUDIO|MULTI|SUBS?|DUBBED";

static BRACKET_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\s*[\[(](?:{TAG_WORDS})[\])]")).unwrap()
});

static TRAILING_DASH_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\s*-\s*(?:{TAG_WORDS})\s*$")).unwrap()
});

static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\((?:19|20)\d{2}\)\s*$").unwrap());

static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip characters that are illegal or troublesome in path components.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|') && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Bound a component to `limit` characters. Over-long input keeps a prefix
/// and the last few characters (a uniqueness hint, often a year or episode
/// tag) joined by an ellipsis marker; the result is then exactly `limit`
/// characters long. Limits below 11 fall back to a plain prefix cut.
pub fn shorten(component: &str, limit: usize) -> String {
    let chars: Vec<char> = component.chars().collect();
    if chars.len() <= limit {
        return component.to_string();
    }
    if limit < 11 {
        return chars[..limit].iter().collect();
    }
    let head: String = chars[..limit - 10].iter().collect();
    let tail: String = chars[chars.len() - 7..].iter().collect();
    format!("{head}...{tail}")
}

/// Normalize a raw catalog title for display and path building.
///
/// Applies Unicode NFC, de-dots space-less scene-style names, strips
/// bracketed and trailing quality tags, drops a trailing "(YYYY)" group
/// (callers re-append the year from the structured field), and collapses
/// whitespace. Total: any input yields a string, possibly empty, and the
/// caller supplies the fallback label.
pub fn clean_title(raw: &str) -> String {
    let mut title: String = raw.nfc().collect();

    // "Movie.Name.2023" style names use dots as word separators.
    if !title.contains(' ') && title.contains('.') {
        title = title.replace('.', " ");
    }

    title = BRACKET_TAG.replace_all(&title, " ").to_string();
    title = TRAILING_DASH_TAG.replace(&title, "").to_string();
    title = TRAILING_YEAR.replace(&title, "").to_string();
    title = MULTI_SPACE.replace_all(&title, " ").to_string();

    sanitize(title.trim())
}

/// Account names become cache directory names; spaces are flattened so the
/// directories stay shell-friendly.
pub fn safe_account_name(name: &str) -> String {
    sanitize(name).replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_illegal_chars() {
        assert_eq!(sanitize(r#"A/B\C:D*E?F"G<H>I|J"#), "ABCDEFGHIJ");
        assert_eq!(sanitize("  plain  "), "plain");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_shorten_short_input_unchanged() {
        assert_eq!(shorten("short", 80), "short");
        let exactly = "x".repeat(80);
        assert_eq!(shorten(&exactly, 80), exactly);
    }

    #[test]
    fn test_shorten_exact_limit_and_stable() {
        let long = "The Quick Brown Fox Jumps Over The Lazy Dog And Keeps On Running Forever More (2021)";
        let out = shorten(long, 40);
        assert_eq!(out.chars().count(), 40);
        assert!(out.contains("..."));
        assert!(out.ends_with("(2021)"));
        assert_eq!(out, shorten(long, 40));
    }

    #[test]
    fn test_shorten_counts_chars_not_bytes() {
        let long = "é".repeat(50);
        let out = shorten(&long, 20);
        assert_eq!(out.chars().count(), 20);
    }

    #[test]
    fn test_shorten_tiny_limit() {
        assert_eq!(shorten("abcdefghijkl", 5), "abcde");
    }

    #[test]
    fn test_clean_title_scene_name() {
        assert_eq!(clean_title("Movie.Name.[1080p].(2023)"), "Movie Name");
    }

    #[test]
    fn test_clean_title_tags_and_year() {
        assert_eq!(clean_title("Some Film (1080p) (2020)"), "Some Film");
        assert_eq!(clean_title("Some Film [MULTI] [SUBS]"), "Some Film");
        assert_eq!(clean_title("Some Film - DUBBED"), "Some Film");
        assert_eq!(clean_title("Some   Film"), "Some Film");
    }

    #[test]
    fn test_clean_title_keeps_non_tag_parens() {
        assert_eq!(clean_title("Mission (Extended Cut)"), "Mission (Extended Cut)");
    }

    #[test]
    fn test_clean_title_total_on_junk() {
        assert_eq!(clean_title(""), "");
        assert_eq!(clean_title("[1080p]"), "");
    }

    #[test]
    fn test_safe_account_name() {
        assert_eq!(safe_account_name("My Provider #1"), "My_Provider_#1");
        assert_eq!(safe_account_name("a/b c"), "ab_c");
    }
}
