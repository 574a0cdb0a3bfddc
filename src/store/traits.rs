//! store::traits
//!
//! Node storage trait definition.
//!
//! # Design
//!
//! `NodeStore` is the seam to whatever persists the content tree. Only
//! three primitives are required (`get`, `save`, `find`) plus id
//! allocation; every tree query the engine needs is a provided method
//! built on top of them, so test doubles stay small.
//!
//! # Tree model
//!
//! The tree is keyed on default-language ids: `parent_id` always names a
//! default-language record. Translations share the parent id of the
//! record they translate and are looked up per language with
//! [`NodeStore::variant`].

use std::collections::HashSet;

use thiserror::Error;

use crate::core::node::{Node, SchemaError};
use crate::core::types::{LanguageId, NodeId};

/// Errors from node storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No node with this id.
    #[error("node not found: {0}")]
    NotFound(NodeId),

    /// Parent pointers loop back onto themselves.
    #[error("cycle in ancestor chain at node {0}")]
    Cycle(NodeId),

    /// The tree file is held by another process.
    #[error("tree is locked by another slugsync process")]
    Locked,

    /// The tree file could not be parsed.
    #[error("failed to parse tree: {0}")]
    Schema(#[from] SchemaError),

    /// The tree could not be serialized.
    #[error("failed to serialize tree: {0}")]
    SerializeError(String),

    /// I/O error.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage of tree nodes.
pub trait NodeStore {
    /// Read one node (deleted nodes included).
    fn get(&self, id: NodeId) -> Result<Option<Node>, StoreError>;

    /// Insert or replace a node.
    fn save(&mut self, node: Node) -> Result<(), StoreError>;

    /// All nodes matching `predicate`, in id order.
    fn find(&self, predicate: &dyn Fn(&Node) -> bool) -> Result<Vec<Node>, StoreError>;

    /// Allocate an unused id.
    fn next_id(&self) -> Result<NodeId, StoreError>;

    /// Read a node that must exist.
    fn require(&self, id: NodeId) -> Result<Node, StoreError> {
        self.get(id)?.ok_or(StoreError::NotFound(id))
    }

    /// Live children of `parent` in `language`, in stable order
    /// (sorting, then id).
    fn children(&self, parent: NodeId, language: LanguageId) -> Result<Vec<Node>, StoreError> {
        let mut children = self.find(&|n: &Node| {
            n.parent_id == Some(parent) && n.language == language && !n.deleted
        })?;
        children.sort_by_key(|n| (n.sorting, n.id));
        Ok(children)
    }

    /// Live translations of a default-language record.
    fn translations(&self, default_id: NodeId) -> Result<Vec<Node>, StoreError> {
        let mut translations =
            self.find(&|n: &Node| n.translation_of == Some(default_id) && !n.deleted)?;
        translations.sort_by_key(|n| (n.language, n.id));
        Ok(translations)
    }

    /// The record of `default_id` in `language`, if it exists.
    fn variant(
        &self,
        default_id: NodeId,
        language: LanguageId,
    ) -> Result<Option<Node>, StoreError> {
        if language.is_default() {
            return self.get(default_id);
        }
        Ok(self
            .find(&|n: &Node| n.translation_of == Some(default_id) && n.language == language)?
            .into_iter()
            .next())
    }

    /// The record of `default_id` in `language`, falling back to the
    /// default-language record when no translation exists.
    fn variant_or_default(
        &self,
        default_id: NodeId,
        language: LanguageId,
    ) -> Result<Option<Node>, StoreError> {
        match self.variant(default_id, language)? {
            Some(node) if !node.deleted => Ok(Some(node)),
            _ => self.get(default_id),
        }
    }

    /// The default-language counterpart of a node (the node itself when it
    /// is not a translation).
    fn counterpart(&self, node: &Node) -> Result<Node, StoreError> {
        match node.translation_of {
            Some(default_id) => self.require(default_id),
            None => Ok(node.clone()),
        }
    }

    /// The ancestor chain of `node`, node first, ending at the tree root.
    ///
    /// Ancestors are resolved in the node's language where a translation
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Cycle` if parent pointers loop and
    /// `StoreError::NotFound` if a parent is missing.
    fn rootline(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        let mut chain = vec![node.clone()];
        let mut seen = HashSet::from([node.default_id()]);
        let mut current = node.parent_id;

        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                return Err(StoreError::Cycle(parent_id));
            }
            let parent = self
                .variant_or_default(parent_id, node.language)?
                .ok_or(StoreError::NotFound(parent_id))?;
            current = parent.parent_id;
            chain.push(parent);
        }

        Ok(chain)
    }

    /// Live nodes sharing `node`'s parent and language, excluding `node`.
    fn siblings(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        let parent = node.parent_id;
        let language = node.language;
        let id = node.id;
        self.find(&|n: &Node| {
            n.parent_id == parent && n.language == language && !n.deleted && n.id != id
        })
    }
}
