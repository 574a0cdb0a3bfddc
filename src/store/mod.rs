//! store
//!
//! Node storage abstraction.
//!
//! # Modules
//!
//! - [`traits`] - The `NodeStore` trait and `StoreError`
//! - [`memory`] - In-memory store (tests, embedding)
//! - [`file`] - JSON tree file store used by the CLI
//! - [`lock`] - Exclusive lock on a tree file
//!
//! Persistence is an external collaborator of the slug engine: the engine
//! only ever talks to `dyn NodeStore`-compatible types.

pub mod file;
pub mod lock;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use lock::TreeLock;
pub use memory::MemoryStore;
pub use traits::{NodeStore, StoreError};
