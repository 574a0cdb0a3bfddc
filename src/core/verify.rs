//! core::verify
//!
//! Fast verification of tree invariants.
//!
//! # Checks
//!
//! - Parent pointers are acyclic
//! - Site roots carry the root slug `/`
//! - Sibling slugs (same parent, same language) are unique
//! - A synchronized, unlocked node sits below its parent's slug
//! - A translation shares the parent of the record it translates
//!
//! Slug syntax (leading `/`, no empty segments) is enforced when the tree
//! is parsed and is not rechecked here.
//!
//! # Invariants
//!
//! - Never mutates the tree
//! - Must be deterministic: errors are reported in node id order

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use super::naming;
use super::node::Node;
use super::types::{LanguageId, NodeId, SlugPath};

/// A violated tree invariant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("cycle in parent pointers at node {0}")]
    CycleDetected(NodeId),

    #[error("site root {node} has slug '{slug}', expected '/'")]
    SiteRootSlug { node: NodeId, slug: SlugPath },

    #[error("nodes {first} and {second} share slug '{slug}' (language {language})")]
    DuplicateSlug {
        slug: SlugPath,
        language: LanguageId,
        first: NodeId,
        second: NodeId,
    },

    #[error("synchronized node {node} has slug '{slug}' outside parent slug '{parent_slug}'")]
    SyncDrift {
        node: NodeId,
        slug: SlugPath,
        parent_slug: SlugPath,
    },

    #[error("translation {node} has parent {found:?}, its default record has {expected:?}")]
    TranslationParent {
        node: NodeId,
        found: Option<NodeId>,
        expected: Option<NodeId>,
    },
}

/// Result of verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }
}

/// Verify the invariants of a whole tree.
///
/// Deleted nodes are ignored except for cycle detection.
pub fn verify_tree(nodes: &[Node]) -> VerifyResult {
    let mut sorted: Vec<&Node> = nodes.iter().collect();
    sorted.sort_by_key(|n| n.id);

    let by_id: HashMap<NodeId, &Node> = sorted.iter().map(|n| (n.id, *n)).collect();
    let variants: HashMap<(NodeId, LanguageId), &Node> = sorted
        .iter()
        .filter(|n| !n.deleted)
        .map(|n| ((n.default_id(), n.language), *n))
        .collect();

    let mut errors = Vec::new();

    if let Some(node) = find_cycle(&sorted, &by_id) {
        errors.push(VerifyError::CycleDetected(node));
        // The remaining checks walk parents and assume a tree.
        return VerifyResult::failure(errors);
    }

    let mut seen_slugs: BTreeMap<(Option<NodeId>, LanguageId, &SlugPath), NodeId> =
        BTreeMap::new();

    for node in sorted.iter().filter(|n| !n.deleted) {
        if node.is_site_root && !node.slug.is_root() {
            errors.push(VerifyError::SiteRootSlug {
                node: node.id,
                slug: node.slug.clone(),
            });
        }

        if !node.is_site_root {
            let key = (node.parent_id, node.language, &node.slug);
            match seen_slugs.get(&key) {
                Some(&first) => errors.push(VerifyError::DuplicateSlug {
                    slug: node.slug.clone(),
                    language: node.language,
                    first,
                    second: node.id,
                }),
                None => {
                    seen_slugs.insert(key, node.id);
                }
            }
        }

        if let Some(default_id) = node.translation_of {
            if let Some(original) = by_id.get(&default_id) {
                if original.parent_id != node.parent_id {
                    errors.push(VerifyError::TranslationParent {
                        node: node.id,
                        found: node.parent_id,
                        expected: original.parent_id,
                    });
                }
            }
        }

        if node.sync_enabled && !node.locked && !node.is_site_root {
            let parent = node.parent_id.and_then(|pid| {
                variants
                    .get(&(pid, node.language))
                    .or_else(|| variants.get(&(pid, LanguageId::DEFAULT)))
            });
            if let Some(parent) = parent {
                let under_parent = parent.slug.is_root()
                    || (naming::is_path_prefix(parent.slug.as_str(), node.slug.as_str())
                        && node.slug != parent.slug);
                if !under_parent {
                    errors.push(VerifyError::SyncDrift {
                        node: node.id,
                        slug: node.slug.clone(),
                        parent_slug: parent.slug.clone(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        VerifyResult::success()
    } else {
        VerifyResult::failure(errors)
    }
}

/// First node (in id order) whose parent chain loops.
fn find_cycle(sorted: &[&Node], by_id: &HashMap<NodeId, &Node>) -> Option<NodeId> {
    let mut acyclic = HashSet::new();

    for node in sorted {
        let mut path = HashSet::new();
        let mut current = Some(node.id);

        while let Some(id) = current {
            if acyclic.contains(&id) {
                break;
            }
            if !path.insert(id) {
                return Some(id);
            }
            current = by_id.get(&id).and_then(|n| n.parent_id);
        }
        acyclic.extend(path);
    }
    None
}
