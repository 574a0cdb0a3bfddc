//! core
//!
//! Core domain types, schemas, and verification for slugsync.
//!
//! # Modules
//!
//! - [`types`] - Strong types: NodeId, LanguageId, SlugPath, etc.
//! - [`naming`] - Slug sanitizing and path helpers
//! - [`node`] - Tree nodes and the tree file schema
//! - [`config`] - Configuration schema and loading
//! - [`verify`] - Fast verification of tree invariants
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid slugs at construction time
//! - Schemas are strict and self-describing
//! - All verification is deterministic

pub mod config;
pub mod naming;
pub mod node;
pub mod types;
pub mod verify;
