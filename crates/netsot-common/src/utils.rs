//! Utility functions for netsot
//!
//! Slug helpers shared by tags, computed fields, and snapshot import.

use std::sync::LazyLock;

/// Characters that are neither word characters, whitespace, nor hyphens
static NON_SLUG_CHARS: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"[^\w\s-]").expect("Invalid regex pattern"));

/// Runs of hyphens and whitespace, collapsed into a single hyphen
static SLUG_SEPARATORS: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"[-\s]+").expect("Invalid regex pattern"));

/// Pattern a stored slug must satisfy
static VALID_SLUG: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[-\w]+$").expect("Invalid regex pattern"));

/// Derive a slug from a display name
///
/// Unicode letters are preserved; everything is lower-cased, punctuation is
/// dropped and whitespace runs become a single hyphen.
///
/// # Examples
///
/// ```
/// use netsot_common::slugify;
///
/// assert_eq!(slugify("Device Role 1"), "device-role-1");
/// assert_eq!(slugify("Testing Unicode: 台灣"), "testing-unicode-台灣");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    SLUG_SEPARATORS
        .replace_all(stripped.trim(), "-")
        .trim_matches(|c| c == '-' || c == '_')
        .to_string()
}

/// Validate a slug contains only word characters and hyphens
///
/// # Examples
///
/// ```
/// use netsot_common::is_valid_slug;
///
/// assert!(is_valid_slug("site-1"));
/// assert!(!is_valid_slug("with spaces"));
/// assert!(!is_valid_slug(""));
/// ```
pub fn is_valid_slug(slug: &str) -> bool {
    VALID_SLUG.is_match(slug)
}
