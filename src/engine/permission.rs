//! engine::permission
//!
//! Permission-scoped locked prefixes.
//!
//! # Model
//!
//! Editors are granted edit rights on subtrees. A non-admin may change a
//! slug only below the *locked prefix*: the parent path of the outermost
//! node on the ancestor chain they can edit. Admins have no locked prefix.
//!
//! With the global last-segment-only policy active, the locked prefix of a
//! non-admin is always the parent path of the node's current slug.
//!
//! # Example
//!
//! ```
//! use slugsync::engine::permission::PermissionScopeResolver;
//!
//! assert!(PermissionScopeResolver::validate_slug_change("/section", "/section/a", "/section/b"));
//! assert!(!PermissionScopeResolver::validate_slug_change("/section", "/section/a", "/other/a"));
//! assert!(PermissionScopeResolver::validate_slug_change("", "/a", "/anything/else"));
//! ```

use std::collections::{BTreeSet, HashSet};

use crate::core::config::Config;
use crate::core::naming;
use crate::core::node::Node;
use crate::core::types::NodeId;
use crate::store::{NodeStore, StoreError};

/// The acting user's permissions.
///
/// Permission-bit evaluation itself belongs to the host system; the engine
/// only asks these questions.
pub trait AuthContext {
    /// Name used in audit entries.
    fn user(&self) -> &str;

    /// Admins bypass every prefix restriction.
    fn is_admin(&self) -> bool;

    /// Whether the user may edit `node`'s record.
    fn can_edit(&self, node: &Node) -> bool;

    /// Whether the user may clear a lock.
    fn can_unlock(&self) -> bool;
}

/// The engine acting on its own behalf (cascade writes).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAuth;

impl AuthContext for SystemAuth {
    fn user(&self) -> &str {
        "_system"
    }

    fn is_admin(&self) -> bool {
        true
    }

    fn can_edit(&self, _node: &Node) -> bool {
        true
    }

    fn can_unlock(&self) -> bool {
        true
    }
}

/// A fixed permission set, for the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    pub user: String,
    pub admin: bool,
    /// Default-language ids the user may edit (their translations included).
    pub editable: HashSet<NodeId>,
    pub unlock: bool,
}

impl StaticAuth {
    /// An admin user.
    pub fn admin(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            admin: true,
            editable: HashSet::new(),
            unlock: true,
        }
    }

    /// An editor restricted to `editable`.
    pub fn editor(user: impl Into<String>, editable: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            user: user.into(),
            admin: false,
            editable: editable.into_iter().collect(),
            unlock: false,
        }
    }

    /// Grant the unlock permission.
    pub fn with_unlock(mut self) -> Self {
        self.unlock = true;
        self
    }
}

impl AuthContext for StaticAuth {
    fn user(&self) -> &str {
        &self.user
    }

    fn is_admin(&self) -> bool {
        self.admin
    }

    fn can_edit(&self, node: &Node) -> bool {
        self.admin || self.editable.contains(&node.default_id())
    }

    fn can_unlock(&self) -> bool {
        self.admin || self.unlock
    }
}

/// What a user may change on one node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionScope {
    /// Chain members (default-language ids) the user can edit.
    pub editable_node_ids: BTreeSet<NodeId>,
    /// Prefix the slug must keep; empty means unrestricted.
    pub locked_prefix: String,
}

impl PermissionScope {
    /// Whether `new` keeps the locked prefix.
    pub fn allows(&self, old: &str, new: &str) -> bool {
        PermissionScopeResolver::validate_slug_change(&self.locked_prefix, old, new)
    }
}

/// Computes locked prefixes and validates slug changes against them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionScopeResolver;

impl PermissionScopeResolver {
    /// Locked prefix for a node given its ancestor chain.
    ///
    /// `chain` runs from the node to the root. Site roots (and the final
    /// root) are never valid anchors. The result is the parent path of the
    /// outermost chain member satisfying `can_edit`, or the parent path of
    /// `current_slug` when none does.
    pub fn locked_prefix(
        chain: &[Node],
        can_edit: impl Fn(&Node) -> bool,
        current_slug: &str,
    ) -> String {
        let anchors = match chain.split_last() {
            Some((root, rest)) if root.parent_id.is_none() => rest,
            _ => chain,
        };

        anchors
            .iter()
            .filter(|n| !n.is_site_root)
            .filter(|n| can_edit(*n))
            .last()
            .map(|n| n.slug.parent_path().to_string())
            .unwrap_or_else(|| naming::parent_path(current_slug).to_string())
    }

    /// Whether `new` keeps `locked_prefix` as an exact path prefix.
    ///
    /// True iff the prefix is empty, `new` equals it, or `new` starts with
    /// the prefix followed by `/`.
    pub fn validate_slug_change(locked_prefix: &str, _old: &str, new: &str) -> bool {
        locked_prefix.is_empty()
            || new == locked_prefix
            || new
                .strip_prefix(locked_prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// The full permission scope of `auth` on `node`.
    ///
    /// A node carrying the full-path override (with full-path editing
    /// enabled) is exempt from last-segment-only, but never from the
    /// chain-based prefix.
    pub fn scope<S: NodeStore + ?Sized>(
        store: &S,
        config: &Config,
        auth: &dyn AuthContext,
        node: &Node,
    ) -> Result<PermissionScope, StoreError> {
        let chain = if node.parent_id.is_some() {
            store.rootline(node)?
        } else {
            vec![node.clone()]
        };
        let editable_node_ids = chain
            .iter()
            .filter(|n| auth.can_edit(n))
            .map(Node::default_id)
            .collect();

        let locked_prefix = if auth.is_admin() {
            String::new()
        } else if config.last_segment_only()
            && !(node.full_path_override && config.full_path_editing())
        {
            node.slug.parent_path().to_string()
        } else {
            Self::locked_prefix(&chain, |n| auth.can_edit(n), node.slug.as_str())
        };

        Ok(PermissionScope {
            editable_node_ids,
            locked_prefix,
        })
    }
}
