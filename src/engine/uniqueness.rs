//! engine::uniqueness
//!
//! Sibling collision resolution.
//!
//! A slug must be unique among live nodes with the same parent and
//! language. On collision the resolver appends `-1`, `-2`, ... to the
//! candidate and returns the first free value. Collisions are never fatal:
//! when the attempt budget runs out the last suffixed candidate is
//! returned anyway.

use std::collections::HashSet;

use crate::core::node::Node;
use crate::core::types::SlugPath;
use crate::store::{NodeStore, StoreError};

/// Resolves sibling collisions by numeric suffixing.
#[derive(Debug, Clone, Copy)]
pub struct UniquenessResolver {
    max_attempts: u32,
}

impl UniquenessResolver {
    /// Create a resolver trying at most `max_attempts` suffixes.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Return `candidate`, or the first suffixed variant not taken by
    /// `taken`.
    ///
    /// # Example
    ///
    /// ```
    /// use slugsync::engine::uniqueness::UniquenessResolver;
    /// use slugsync::core::types::SlugPath;
    ///
    /// let resolver = UniquenessResolver::new(100);
    /// let taken = ["/demo", "/demo-1"];
    /// let unique = resolver.ensure_unique(&SlugPath::new("/demo").unwrap(), taken);
    /// assert_eq!(unique.as_str(), "/demo-2");
    /// ```
    pub fn ensure_unique<'a>(
        &self,
        candidate: &SlugPath,
        taken: impl IntoIterator<Item = &'a str>,
    ) -> SlugPath {
        let taken: HashSet<&str> = taken.into_iter().collect();
        if !taken.contains(candidate.as_str()) {
            return candidate.clone();
        }

        let mut attempt = String::new();
        for n in 1..=self.max_attempts {
            attempt = format!("{candidate}-{n}");
            if !taken.contains(attempt.as_str()) {
                tracing::debug!(candidate = %candidate, resolved = %attempt, "resolved slug collision");
                return SlugPath::from_sanitized(attempt);
            }
        }

        tracing::warn!(
            candidate = %candidate,
            attempts = self.max_attempts,
            "uniqueness attempts exhausted, keeping last suffix"
        );
        SlugPath::from_sanitized(attempt)
    }

    /// Resolve `candidate` against the live siblings of `node` in `store`.
    pub fn ensure_unique_for<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        node: &Node,
        candidate: &SlugPath,
    ) -> Result<SlugPath, StoreError> {
        let siblings = store.siblings(node)?;
        Ok(self.ensure_unique(candidate, siblings.iter().map(|n| n.slug.as_str())))
    }
}

impl Default for UniquenessResolver {
    fn default() -> Self {
        Self::new(1000)
    }
}
