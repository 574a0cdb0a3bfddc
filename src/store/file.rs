//! store::file
//!
//! JSON tree file store.
//!
//! # Storage
//!
//! The whole tree lives in one [`TreeDocument`] JSON file. Opening the store
//! takes the [`TreeLock`], loads the tree into memory, and mutations stay in
//! memory until [`FileStore::flush`] writes the document back atomically
//! (temp file + rename).
//!
//! # Example
//!
//! ```no_run
//! use slugsync::store::{FileStore, NodeStore};
//! use slugsync::core::types::NodeId;
//! use std::path::Path;
//!
//! let mut store = FileStore::open(Path::new("site.json")).unwrap();
//! let mut node = store.require(NodeId::new(2)).unwrap();
//! node.locked = true;
//! store.save(node).unwrap();
//! store.flush().unwrap();
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::lock::TreeLock;
use super::memory::MemoryStore;
use super::traits::{NodeStore, StoreError};
use crate::core::node::{parse_tree, Node, TreeDocument};
use crate::core::types::{NodeId, UtcTimestamp};

/// Node store persisted as a JSON tree document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    nodes: MemoryStore,
    dirty: bool,
    _lock: TreeLock,
}

impl FileStore {
    /// Lock and load a tree file.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Locked`] if another process holds the tree
    /// - [`StoreError::Io`] if the file cannot be read
    /// - [`StoreError::Schema`] if the document is invalid
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let lock = TreeLock::acquire(path)?;
        let contents = fs::read_to_string(path)?;
        let doc = parse_tree(&contents)?;

        tracing::debug!(path = %path.display(), nodes = doc.nodes.len(), "opened tree");
        Ok(Self {
            path: path.to_path_buf(),
            nodes: MemoryStore::from_nodes(doc.nodes),
            dirty: false,
            _lock: lock,
        })
    }

    /// Create a new tree file holding `nodes`, failing if it exists.
    pub fn create(path: &Path, nodes: Vec<Node>) -> Result<Self, StoreError> {
        if path.exists() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            )));
        }
        TreeDocument::new(nodes.clone()).validate()?;

        let lock = TreeLock::acquire(path)?;
        let mut store = Self {
            path: path.to_path_buf(),
            nodes: MemoryStore::from_nodes(nodes),
            dirty: true,
            _lock: lock,
        };
        store.flush()?;
        Ok(store)
    }

    /// Path of the tree file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are unflushed changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the tree back to disk if it changed.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }

        let mut doc = TreeDocument::new(self.nodes.clone().into_nodes());
        doc.updated_at = Some(UtcTimestamp::now());
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| StoreError::SerializeError(e.to_string()))?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        self.dirty = false;
        tracing::debug!(path = %self.path.display(), "flushed tree");
        Ok(())
    }
}

impl NodeStore for FileStore {
    fn get(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        self.nodes.get(id)
    }

    fn save(&mut self, node: Node) -> Result<(), StoreError> {
        self.dirty = true;
        self.nodes.save(node)
    }

    fn find(&self, predicate: &dyn Fn(&Node) -> bool) -> Result<Vec<Node>, StoreError> {
        self.nodes.find(predicate)
    }

    fn next_id(&self) -> Result<NodeId, StoreError> {
        self.nodes.next_id()
    }
}
