//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`NodeId`] - Identifier of a tree node record
//! - [`LanguageId`] - Language of a node record (0 is the default language)
//! - [`SlugPath`] - Validated slug, always starting with `/`
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Validation
//!
//! These types enforce validity at construction time. A slug that does not
//! start with `/` cannot be represented.
//!
//! # Examples
//!
//! ```
//! use slugsync::core::types::SlugPath;
//!
//! let slug = SlugPath::new("/shop/shoes").unwrap();
//! assert_eq!(slug.last_segment(), "/shoes");
//!
//! assert!(SlugPath::new("shop").is_err());
//! assert!(SlugPath::new("/shop//shoes").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::naming;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    #[error("invalid node id: {0}")]
    InvalidNodeId(String),
}

/// Identifier of a node record.
///
/// Every language variant of a page is its own record with its own id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a node id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::str::FromStr for NodeId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidNodeId(s.to_string()))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Language of a node record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LanguageId(u32);

impl LanguageId {
    /// The default language.
    pub const DEFAULT: LanguageId = LanguageId(0);

    /// Create a language id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this is the default language.
    pub const fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for LanguageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated slug path.
///
/// Slugs must:
/// - Start with `/`
/// - Not contain empty segments (`//`)
/// - Not end with `/`, except for the root slug `/`
/// - Not contain whitespace or control characters
///
/// Slugs are not required to be sanitized: editors with full access may
/// store anything that satisfies the rules above.
///
/// # Example
///
/// ```
/// use slugsync::core::types::SlugPath;
///
/// let root = SlugPath::root();
/// assert!(root.is_root());
///
/// let shop = root.join("shop");
/// assert_eq!(shop.as_str(), "/shop");
/// assert_eq!(shop.join("shoes").as_str(), "/shop/shoes");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlugPath(String);

impl SlugPath {
    /// Create a new validated slug.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSlug` if the value violates the slug rules.
    pub fn new(slug: impl Into<String>) -> Result<Self, TypeError> {
        let slug = slug.into();
        Self::validate(&slug)?;
        Ok(Self(slug))
    }

    /// The root slug `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Build a slug from an already sanitized path.
    ///
    /// Output of [`naming::sanitize_path`] and [`naming::join_path`] on
    /// sanitized parts always satisfies the slug rules.
    pub(crate) fn from_sanitized(path: String) -> Self {
        debug_assert!(Self::validate(&path).is_ok(), "not a sanitized path: {path}");
        Self(path)
    }

    fn validate(slug: &str) -> Result<(), TypeError> {
        if !slug.starts_with('/') {
            return Err(TypeError::InvalidSlug(format!(
                "slug must start with '/': {slug:?}"
            )));
        }
        if slug == "/" {
            return Ok(());
        }
        if slug.ends_with('/') {
            return Err(TypeError::InvalidSlug(format!(
                "slug cannot end with '/': {slug:?}"
            )));
        }
        if slug.contains("//") {
            return Err(TypeError::InvalidSlug(format!(
                "slug cannot contain empty segments: {slug:?}"
            )));
        }
        if slug.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidSlug(format!(
                "slug cannot contain whitespace or control characters: {slug:?}"
            )));
        }
        Ok(())
    }

    /// Whether this is the root slug.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Get the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the segments without separators.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        naming::segments(&self.0)
    }

    /// The parent path, or `""` for top-level slugs and the root.
    pub fn parent_path(&self) -> &str {
        naming::parent_path(&self.0)
    }

    /// The last segment including its leading `/`.
    pub fn last_segment(&self) -> &str {
        naming::last_segment(&self.0)
    }

    /// Append a local part below this slug.
    ///
    /// The local part is sanitized segment-wise so the result is always a
    /// valid slug.
    pub fn join(&self, local: &str) -> SlugPath {
        let local = naming::sanitize_path(local, naming::DEFAULT_FALLBACK);
        Self::from_sanitized(naming::join_path(&self.0, &local))
    }

    /// Whether `prefix` is a segment-wise prefix of this slug.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        naming::is_path_prefix(prefix, &self.0)
    }
}

impl TryFrom<String> for SlugPath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SlugPath> for String {
    fn from(slug: SlugPath) -> Self {
        slug.0
    }
}

impl AsRef<str> for SlugPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SlugPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC timestamp, serialized as RFC3339.
///
/// # Example
///
/// ```
/// use slugsync::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod slug_path {
        use super::*;

        #[test]
        fn valid_slugs() {
            assert!(SlugPath::new("/").is_ok());
            assert!(SlugPath::new("/a").is_ok());
            assert!(SlugPath::new("/a/b-c/d_e").is_ok());
            assert!(SlugPath::new("/über-uns").is_ok());
        }

        #[test]
        fn rejects_missing_leading_slash() {
            assert!(SlugPath::new("").is_err());
            assert!(SlugPath::new("a/b").is_err());
        }

        #[test]
        fn rejects_trailing_slash_and_empty_segments() {
            assert!(SlugPath::new("/a/").is_err());
            assert!(SlugPath::new("/a//b").is_err());
        }

        #[test]
        fn rejects_whitespace() {
            assert!(SlugPath::new("/a b").is_err());
            assert!(SlugPath::new("/a\tb").is_err());
        }

        #[test]
        fn join_onto_root() {
            assert_eq!(SlugPath::root().join("/shop").as_str(), "/shop");
            assert_eq!(SlugPath::root().join("").as_str(), "/");
        }

        #[test]
        fn join_sanitizes_local_part() {
            let shop = SlugPath::new("/shop").unwrap();
            assert_eq!(shop.join("New Shoes").as_str(), "/shop/new-shoes");
        }

        #[test]
        fn parent_and_last_segment() {
            let slug = SlugPath::new("/shop/shoes").unwrap();
            assert_eq!(slug.parent_path(), "/shop");
            assert_eq!(slug.last_segment(), "/shoes");
            assert_eq!(slug.segments().collect::<Vec<_>>(), vec!["shop", "shoes"]);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<SlugPath, _> = serde_json::from_str("\"no-slash\"");
            assert!(result.is_err());
        }
    }

    mod node_id {
        use super::*;

        #[test]
        fn parses_from_str() {
            assert_eq!("42".parse::<NodeId>().unwrap(), NodeId::new(42));
            assert!("x".parse::<NodeId>().is_err());
        }

        #[test]
        fn serializes_transparently() {
            assert_eq!(serde_json::to_string(&NodeId::new(7)).unwrap(), "7");
        }
    }
}
