//! slugsync - Cascading slug synchronization for hierarchical content trees
//!
//! slugsync keeps the URL slugs of a page tree consistent: renaming or
//! moving a page regenerates the slugs of its synchronized descendants,
//! locked slugs stay frozen, and editors can be confined below a locked
//! prefix of the tree.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Lock, sync and permission policies, mutations and the cascade
//! - [`protocol`] - Proposal protocol between the editing widget and the server
//! - [`widget`] - Slug editing widget: reducer, render model, async runtime
//! - [`store`] - Node storage abstraction (memory and file backed)
//! - [`core`] - Domain types, naming rules, schemas, configuration, verification
//!
//! # Correctness Invariants
//!
//! 1. Sibling slugs are unique per language
//! 2. Locked slugs are never rewritten by a cascade
//! 3. Editors never write outside their locked prefix
//! 4. A cascade never re-enters itself and never fails its trigger

pub mod cli;
pub mod core;
pub mod engine;
pub mod protocol;
pub mod store;
pub mod widget;
