//! engine
//!
//! The slug synchronization engine.
//!
//! # Architecture
//!
//! Three independently composable policies decide what happens to a slug:
//!
//! 1. **Lock** ([`policy::LockPolicyEngine`]): freezes a node's slug
//! 2. **Sync** ([`policy::SyncPolicyEngine`]): regenerates from source fields
//! 3. **Permission** ([`permission::PermissionScopeResolver`]): confines
//!    edits below a per-user locked prefix
//!
//! [`mutation::SlugEngine`] applies them to every write, resolves sibling
//! collisions through [`uniqueness::UniquenessResolver`], and hands slug
//! changes to [`cascade::CascadeUpdateCoordinator`], which propagates them
//! to descendants.
//!
//! # Invariants
//!
//! - Locked slugs are never changed by a cascade
//! - Sibling slugs (same parent, same language) are unique
//! - A write spawned by a cascade never starts another cascade
//!   ([`correlation::ReentrancyGuard`])
//! - A cascade never fails the operation that triggered it
//!
//! # Example
//!
//! ```
//! use slugsync::core::config::Config;
//! use slugsync::core::node::Node;
//! use slugsync::core::types::{NodeId, SlugPath};
//! use slugsync::engine::{CorrelationId, NoRedirects, NodeUpdate, SlugEngine, SystemAuth};
//! use slugsync::store::{MemoryStore, NodeStore};
//!
//! let store = MemoryStore::from_nodes([
//!     Node::site_root(NodeId::new(1)),
//!     Node::new(NodeId::new(2), Some(NodeId::new(1)), SlugPath::new("/shop").unwrap()),
//!     Node::new(NodeId::new(3), Some(NodeId::new(2)), SlugPath::new("/shop/shoes").unwrap())
//!         .with_field("title", "Shoes")
//!         .with_sync(true),
//! ]);
//! let mut engine = SlugEngine::new(store, NoRedirects, Config::default());
//!
//! engine
//!     .process(
//!         NodeUpdate::new(NodeId::new(2)).with_slug("/store"),
//!         &SystemAuth,
//!         &CorrelationId::new(),
//!     )
//!     .unwrap();
//!
//! let child = engine.store().require(NodeId::new(3)).unwrap();
//! assert_eq!(child.slug.as_str(), "/store/shoes");
//! ```

pub mod cascade;
pub mod correlation;
pub mod mutation;
pub mod permission;
pub mod policy;
pub mod uniqueness;

pub use cascade::{
    CascadeReport, CascadeUpdateCoordinator, NoRedirects, RecordingRedirects, Redirect,
    RedirectSink, SkipReason, SlugChange,
};
pub use correlation::{CorrelationId, ReentrancyGuard, CASCADE_ASPECT};
pub use mutation::{
    MutationError, MutationWarning, NewNode, NodeUpdate, SlugEngine, UpdateOutcome, AUDIT_TARGET,
};
pub use permission::{
    AuthContext, PermissionScope, PermissionScopeResolver, StaticAuth, SystemAuth,
};
pub use policy::{LockPolicyEngine, SlugGenerator, SyncPolicyEngine, UnlockDenied};
pub use uniqueness::UniquenessResolver;
