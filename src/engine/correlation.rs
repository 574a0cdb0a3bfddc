//! engine::correlation
//!
//! Correlation ids and the re-entrancy guard.
//!
//! Every top-level mutation carries a [`CorrelationId`]. Mutations spawned
//! by the cascade derive a child id tagged with [`CASCADE_ASPECT`]; any
//! handler that would start another cascade checks [`ReentrancyGuard`]
//! first and does nothing when the tag is present. The id is threaded
//! explicitly through every call, there is no process-wide state.
//!
//! # Example
//!
//! ```
//! use slugsync::engine::correlation::{CorrelationId, ReentrancyGuard, CASCADE_ASPECT};
//!
//! let top = CorrelationId::new();
//! assert!(ReentrancyGuard::may_cascade(&top));
//!
//! let spawned = top.derive(CASCADE_ASPECT);
//! assert_eq!(spawned.id(), top.id());
//! assert!(!ReentrancyGuard::may_cascade(&spawned));
//! ```

use std::collections::BTreeSet;

use uuid::Uuid;

/// Aspect marking a mutation spawned by the slug cascade.
pub const CASCADE_ASPECT: &str = "slug-cascade";

/// Identity and markers of one logical operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId {
    id: Uuid,
    aspects: BTreeSet<String>,
}

impl CorrelationId {
    /// A fresh id with no aspects.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            aspects: BTreeSet::new(),
        }
    }

    /// The operation id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A copy of this id carrying one more aspect.
    pub fn derive(&self, aspect: impl Into<String>) -> Self {
        let mut aspects = self.aspects.clone();
        aspects.insert(aspect.into());
        Self {
            id: self.id,
            aspects,
        }
    }

    /// Whether `aspect` is set.
    pub fn has_aspect(&self, aspect: &str) -> bool {
        self.aspects.contains(aspect)
    }

    /// All aspects, sorted.
    pub fn aspects(&self) -> impl Iterator<Item = &str> {
        self.aspects.iter().map(String::as_str)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)?;
        for aspect in &self.aspects {
            write!(f, "+{aspect}")?;
        }
        Ok(())
    }
}

/// Decides whether a handler may start cascading work.
#[derive(Debug, Clone, Copy)]
pub struct ReentrancyGuard;

impl ReentrancyGuard {
    /// `false` when the operation was itself spawned by a cascade.
    pub fn may_cascade(correlation: &CorrelationId) -> bool {
        if correlation.has_aspect(CASCADE_ASPECT) {
            tracing::trace!(correlation = %correlation, "re-entrant cascade suppressed");
            return false;
        }
        true
    }
}
