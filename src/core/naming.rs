//! core::naming
//!
//! Slug sanitization and path helpers.
//!
//! # Features
//!
//! - Sanitize free text into a single path segment
//! - Sanitize a user-typed path into canonical slug form
//! - Split, join and compare slug paths segment-wise
//!
//! All helpers are pure and operate on string slices so the widget and the
//! server side share one implementation.

/// Default character substituted for whitespace and separators.
pub const DEFAULT_FALLBACK: char = '-';

/// Sanitize free text into a single path segment.
///
/// - Lowercase
/// - Whitespace, `_`, `+`, `.` and `/` become the fallback character
/// - Anything else that is not alphanumeric or `-`/`_` is removed
/// - Runs of the fallback character collapse, edges are trimmed
///
/// # Example
///
/// ```
/// use slugsync::core::naming::sanitize_segment;
///
/// assert_eq!(sanitize_segment("Hello World", '-'), "hello-world");
/// assert_eq!(sanitize_segment("  Shoes & Boots!  ", '-'), "shoes-boots");
/// assert_eq!(sanitize_segment("a/b", '-'), "a-b");
/// ```
pub fn sanitize_segment(raw: &str, fallback: char) -> String {
    let mut out = String::with_capacity(raw.len());

    for c in raw.chars().flat_map(char::to_lowercase) {
        let mapped = if c.is_whitespace() || matches!(c, '+' | '.' | '/') {
            Some(fallback)
        } else if c.is_alphanumeric() || c == '-' || c == '_' {
            Some(c)
        } else {
            None
        };

        if let Some(c) = mapped {
            if c == fallback && out.ends_with(fallback) {
                continue;
            }
            out.push(c);
        }
    }

    out.trim_matches(fallback).to_string()
}

/// Sanitize a user-typed path into canonical slug form.
///
/// Each `/`-separated segment is sanitized with [`sanitize_segment`],
/// empty segments are dropped, and the result always starts with `/`.
/// An input with no usable characters becomes the root path `/`.
///
/// # Example
///
/// ```
/// use slugsync::core::naming::sanitize_path;
///
/// assert_eq!(sanitize_path("Products//New Shoes/", '-'), "/products/new-shoes");
/// assert_eq!(sanitize_path("", '-'), "/");
/// ```
pub fn sanitize_path(raw: &str, fallback: char) -> String {
    let segments: Vec<String> = raw
        .split('/')
        .map(|segment| sanitize_segment(segment, fallback))
        .filter(|segment| !segment.is_empty())
        .collect();

    format!("/{}", segments.join("/"))
}

/// Split a slug into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// The parent path of a slug, or `""` for top-level slugs and the root.
///
/// # Example
///
/// ```
/// use slugsync::core::naming::parent_path;
///
/// assert_eq!(parent_path("/a/b/c"), "/a/b");
/// assert_eq!(parent_path("/a"), "");
/// assert_eq!(parent_path("/"), "");
/// ```
pub fn parent_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "",
        Some(idx) => &trimmed[..idx],
    }
}

/// The last segment of a slug including its leading `/`.
///
/// ```
/// use slugsync::core::naming::last_segment;
///
/// assert_eq!(last_segment("/a/b"), "/b");
/// assert_eq!(last_segment("/"), "/");
/// ```
pub fn last_segment(path: &str) -> &str {
    let parent = parent_path(path);
    &path[parent.len()..]
}

/// Join a parent slug and a local part into one slug.
///
/// The local part may or may not start with `/`. Joining onto the root or
/// onto an empty parent yields `/<local>`.
///
/// ```
/// use slugsync::core::naming::join_path;
///
/// assert_eq!(join_path("/shop", "shoes"), "/shop/shoes");
/// assert_eq!(join_path("/", "/shoes"), "/shoes");
/// assert_eq!(join_path("/shop", ""), "/shop");
/// ```
pub fn join_path(parent: &str, local: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let local = local.trim_matches('/');
    match (parent.is_empty(), local.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{local}"),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}/{local}"),
    }
}

/// Whether `prefix` is a segment-wise prefix of `path`.
///
/// An empty prefix and the root are prefixes of everything. Matching is on
/// whole segments, so `/shop` is not a prefix of `/shopping`.
///
/// ```
/// use slugsync::core::naming::is_path_prefix;
///
/// assert!(is_path_prefix("/shop", "/shop/shoes"));
/// assert!(is_path_prefix("/shop", "/shop"));
/// assert!(!is_path_prefix("/shop", "/shopping"));
/// ```
pub fn is_path_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// The remainder of `path` below `prefix`, with its leading `/`.
///
/// Returns `None` when `prefix` is not a segment-wise prefix of `path`.
pub fn strip_path_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    if !is_path_prefix(prefix, path) {
        return None;
    }
    Some(&path[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_segment_basic() {
        assert_eq!(sanitize_segment("Hello World", '-'), "hello-world");
        assert_eq!(sanitize_segment("fix: something", '-'), "fix-something");
        assert_eq!(sanitize_segment("Über Uns", '-'), "über-uns");
    }

    #[test]
    fn sanitize_segment_collapses_fallback_runs() {
        assert_eq!(sanitize_segment("a -- b", '-'), "a-b");
        assert_eq!(sanitize_segment("__a__", '_'), "a");
        assert_eq!(sanitize_segment("a_b c", '_'), "a_b_c");
    }

    #[test]
    fn sanitize_segment_keeps_hyphen_with_other_fallback() {
        assert_eq!(sanitize_segment("a-b c", '_'), "a-b_c");
    }

    #[test]
    fn sanitize_segment_handles_empty() {
        assert_eq!(sanitize_segment("", '-'), "");
        assert_eq!(sanitize_segment("!!!", '-'), "");
    }

    #[test]
    fn sanitize_path_is_idempotent() {
        let once = sanitize_path("/Shop/ Neue Schuhe //Sale!", '-');
        assert_eq!(once, "/shop/neue-schuhe/sale");
        assert_eq!(sanitize_path(&once, '-'), once);
    }

    #[test]
    fn parent_and_last_segment_reconstruct() {
        for path in ["/a", "/a/b", "/a/b/c"] {
            assert_eq!(format!("{}{}", parent_path(path), last_segment(path)), path);
        }
    }

    #[test]
    fn strip_prefix_requires_whole_segments() {
        assert_eq!(strip_path_prefix("/shop", "/shop/shoes"), Some("/shoes"));
        assert_eq!(strip_path_prefix("/shop", "/shopping"), None);
        assert_eq!(strip_path_prefix("", "/x"), Some("/x"));
    }
}
