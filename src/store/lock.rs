//! store::lock
//!
//! Exclusive lock on a tree file.
//!
//! # Architecture
//!
//! The lock ensures only one slugsync process mutates a tree file at a
//! time. It lives next to the tree as `<tree>.lock` and uses an OS-level
//! exclusive lock, so it works across processes.
//!
//! # Invariants
//!
//! - Lock is held for the whole lifetime of an open [`FileStore`]
//! - Lock is released on drop (RAII)
//! - Acquisition is non-blocking (fails fast if locked)
//!
//! [`FileStore`]: super::FileStore

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::traits::StoreError;

/// An exclusive lock on one tree file.
#[derive(Debug)]
pub struct TreeLock {
    path: PathBuf,
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl TreeLock {
    /// The lock file path for a tree file.
    pub fn path_for(tree: &Path) -> PathBuf {
        let mut name = tree
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        tree.with_file_name(name)
    }

    /// Acquire the lock for `tree`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Locked`] if another process holds the lock
    /// - [`StoreError::Io`] if the lock file cannot be created
    pub fn acquire(tree: &Path) -> Result<Self, StoreError> {
        let path = Self::path_for(tree);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(StoreError::Locked),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Whether this guard still holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock early.
    pub fn release(&mut self) -> Result<(), StoreError> {
        if let Some(file) = self.file.take() {
            file.unlock()?;
        }
        Ok(())
    }
}

impl Drop for TreeLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_sits_next_to_tree() {
        let path = TreeLock::path_for(Path::new("/data/site.json"));
        assert_eq!(path, PathBuf::from("/data/site.json.lock"));
    }

    #[test]
    fn lock_prevents_second_acquire() {
        let temp = TempDir::new().unwrap();
        let tree = temp.path().join("tree.json");

        let lock = TreeLock::acquire(&tree).expect("first acquire");
        assert!(lock.is_held());
        assert!(lock.path().exists());

        assert!(matches!(TreeLock::acquire(&tree), Err(StoreError::Locked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = TempDir::new().unwrap();
        let tree = temp.path().join("tree.json");

        {
            let _lock = TreeLock::acquire(&tree).expect("first acquire");
        }

        let lock = TreeLock::acquire(&tree).expect("second acquire");
        assert!(lock.is_held());
    }

    #[test]
    fn multiple_release_calls_are_safe() {
        let temp = TempDir::new().unwrap();
        let mut lock = TreeLock::acquire(&temp.path().join("tree.json")).unwrap();

        lock.release().unwrap();
        lock.release().unwrap();
        assert!(!lock.is_held());
    }
}
