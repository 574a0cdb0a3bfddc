//! core::node
//!
//! Node record schema and the on-disk tree document (v1).
//!
//! # Schema Design
//!
//! - Self-describing with `kind` and `schema_version`
//! - Strictly parsed (unknown fields rejected)
//! - The full-path override flag is transient and never serialized
//!
//! # Translations
//!
//! Each language variant of a page is its own [`Node`]. Translations point
//! at their default-language record through `translation_of` and share its
//! `parent_id`. Their sync and lock flags are derived from that record.
//!
//! # Example
//!
//! ```
//! use slugsync::core::node::{parse_tree, Node, TreeDocument, TREE_KIND};
//! use slugsync::core::types::{NodeId, SlugPath};
//!
//! let root = Node::site_root(NodeId::new(1));
//! let page = Node::new(NodeId::new(2), Some(NodeId::new(1)), SlugPath::new("/about").unwrap())
//!     .with_field("title", "About");
//!
//! let doc = TreeDocument::new(vec![root, page]);
//! assert_eq!(doc.kind, TREE_KIND);
//!
//! let json = serde_json::to_string(&doc).unwrap();
//! let parsed = parse_tree(&json).unwrap();
//! assert_eq!(parsed.nodes.len(), 2);
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{LanguageId, NodeId, SlugPath, TypeError, UtcTimestamp};

/// The kind identifier for tree documents.
pub const TREE_KIND: &str = "slugsync.tree";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from parsing or validating tree documents.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse tree: {0}")]
    ParseError(String),

    #[error("invalid kind '{found}', expected '{}'", TREE_KIND)]
    InvalidKind { found: String },

    #[error("unsupported schema version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("duplicate node id {0}")]
    DuplicateId(NodeId),

    #[error("node {node} references missing {relation} {target}")]
    DanglingReference {
        node: NodeId,
        relation: &'static str,
        target: NodeId,
    },

    #[error("type validation failed: {0}")]
    TypeError(#[from] TypeError),
}

/// A node of the content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Node {
    pub id: NodeId,

    /// Parent record (default-language id). `None` only for the tree root.
    #[serde(default)]
    pub parent_id: Option<NodeId>,

    #[serde(default)]
    pub language: LanguageId,

    /// Default-language record this node translates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_of: Option<NodeId>,

    /// Ordering among siblings.
    #[serde(default)]
    pub sorting: u32,

    /// Whether this node starts a site (its slug is `/`).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_site_root: bool,

    /// Soft-delete flag. Deleted nodes do not take part in uniqueness.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,

    pub slug: SlugPath,

    #[serde(default)]
    pub sync_enabled: bool,

    #[serde(default)]
    pub locked: bool,

    /// One-time relaxation of last-segment-only validation. Never persisted.
    #[serde(skip)]
    pub full_path_override: bool,

    /// Source field values the slug generator reads from.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Node {
    /// Create a default-language node with the given slug.
    pub fn new(id: NodeId, parent_id: Option<NodeId>, slug: SlugPath) -> Self {
        Self {
            id,
            parent_id,
            language: LanguageId::DEFAULT,
            translation_of: None,
            sorting: 0,
            is_site_root: false,
            deleted: false,
            slug,
            sync_enabled: false,
            locked: false,
            full_path_override: false,
            fields: BTreeMap::new(),
        }
    }

    /// Create a site root node with slug `/`.
    pub fn site_root(id: NodeId) -> Self {
        let mut node = Self::new(id, None, SlugPath::root());
        node.is_site_root = true;
        node
    }

    /// Builder-style setter for a source field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style setter for the sync flag.
    pub fn with_sync(mut self, enabled: bool) -> Self {
        self.sync_enabled = enabled;
        self
    }

    /// Builder-style setter for the lock flag.
    pub fn with_lock(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Builder-style setter for sibling ordering.
    pub fn with_sorting(mut self, sorting: u32) -> Self {
        self.sorting = sorting;
        self
    }

    /// Turn this node into a translation of `default_id` in `language`.
    pub fn translating(mut self, default_id: NodeId, language: LanguageId) -> Self {
        self.translation_of = Some(default_id);
        self.language = language;
        self
    }

    /// Whether this record is a translation.
    pub fn is_translation(&self) -> bool {
        self.translation_of.is_some()
    }

    /// The id the tree structure is keyed on (the default-language id).
    pub fn default_id(&self) -> NodeId {
        self.translation_of.unwrap_or(self.id)
    }

    /// Look up a source field, treating blank values as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// The tree file format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TreeDocument {
    /// Kind identifier (always "slugsync.tree")
    pub kind: String,

    /// Schema version (always 1)
    pub schema_version: u32,

    /// When the file was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<UtcTimestamp>,

    pub nodes: Vec<Node>,
}

impl TreeDocument {
    /// Wrap nodes in a current-version document.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            kind: TREE_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            updated_at: None,
            nodes,
        }
    }

    /// Validate structural references.
    ///
    /// Checks that ids are unique and that parent and translation pointers
    /// resolve. Cycles are reported by [`crate::core::verify`].
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id) {
                return Err(SchemaError::DuplicateId(node.id));
            }
        }

        for node in &self.nodes {
            if let Some(parent) = node.parent_id {
                if !ids.contains(&parent) {
                    return Err(SchemaError::DanglingReference {
                        node: node.id,
                        relation: "parent",
                        target: parent,
                    });
                }
            }
            if let Some(original) = node.translation_of {
                if !ids.contains(&original) {
                    return Err(SchemaError::DanglingReference {
                        node: node.id,
                        relation: "default-language record",
                        target: original,
                    });
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TreeEnvelope {
    kind: String,
    schema_version: u32,
}

/// Parse a tree document with version dispatch.
///
/// # Errors
///
/// Returns an error if the JSON is malformed, the `kind` or
/// `schema_version` is not recognized, or references do not resolve.
pub fn parse_tree(json: &str) -> Result<TreeDocument, SchemaError> {
    let envelope: TreeEnvelope =
        serde_json::from_str(json).map_err(|e| SchemaError::ParseError(e.to_string()))?;

    if envelope.kind != TREE_KIND {
        return Err(SchemaError::InvalidKind {
            found: envelope.kind,
        });
    }

    match envelope.schema_version {
        1 => {
            let doc: TreeDocument =
                serde_json::from_str(json).map_err(|e| SchemaError::ParseError(e.to_string()))?;
            doc.validate()?;
            Ok(doc)
        }
        v => Err(SchemaError::UnsupportedVersion(v)),
    }
}
