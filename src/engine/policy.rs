//! engine::policy
//!
//! Sync and lock policies, and the slug generator they drive.
//!
//! # Policies
//!
//! - **Sync**: a node whose effective sync flag is on (and the global sync
//!   feature enabled) regenerates its slug from source fields.
//! - **Lock**: a node whose effective lock flag is on is skipped by both
//!   sync and cascade. Its descendants are not affected by the flag and
//!   are still rebuilt below its frozen slug.
//!
//! Translations never carry their own flags: the effective values come
//! from the default-language record.
//!
//! # Generator
//!
//! The generator reads the configured fallback chains: the first non-empty
//! field of every chain contributes one path part. Post modifiers run on
//! the raw value, then each part is sanitized. The last field of each chain
//! is required; without it no regeneration is requested.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::config::{Config, PostModifier};
use crate::core::naming;
use crate::core::node::Node;
use crate::core::types::{NodeId, SlugPath};
use crate::engine::permission::AuthContext;
use crate::engine::uniqueness::UniquenessResolver;
use crate::store::{NodeStore, StoreError};

/// Builds local slug parts from source field values.
#[derive(Debug, Clone, Copy)]
pub struct SlugGenerator<'a> {
    config: &'a Config,
}

impl<'a> SlugGenerator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// The local part generated from `fields`, without leading `/`.
    ///
    /// Returns `None` when no chain yields a usable value.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use slugsync::core::config::Config;
    /// use slugsync::engine::policy::SlugGenerator;
    ///
    /// let config = Config::from_toml_str(
    ///     "[generator]\nfields = [[\"nav_title\", \"title\"]]\n",
    /// ).unwrap();
    /// let fields = BTreeMap::from([("title".to_string(), "Shoes & Boots".to_string())]);
    ///
    /// let local = SlugGenerator::new(&config).local_part(&fields);
    /// assert_eq!(local.as_deref(), Some("shoes-boots"));
    /// ```
    pub fn local_part(&self, fields: &BTreeMap<String, String>) -> Option<String> {
        let fallback = self.config.fallback_character();
        let parts: Vec<String> = self
            .config
            .generator_fields()
            .iter()
            .filter_map(|chain| {
                chain.iter().find_map(|name| {
                    fields
                        .get(name)
                        .map(String::as_str)
                        .filter(|v| !v.trim().is_empty())
                })
            })
            .map(|raw| self.render_part(raw, fallback))
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    fn render_part(&self, raw: &str, fallback: char) -> String {
        let mut value = raw.to_string();
        for modifier in self.config.post_modifiers() {
            if let PostModifier::Replace { from, to } = modifier {
                if !from.is_empty() {
                    value = value.replace(from.as_str(), to);
                }
            }
        }

        let mut part = naming::sanitize_segment(&value, fallback);
        for modifier in self.config.post_modifiers() {
            if let PostModifier::MaxSegmentLength { max } = modifier {
                if part.chars().count() > *max {
                    part = part.chars().take(*max).collect::<String>();
                    part = part.trim_end_matches(fallback).to_string();
                }
            }
        }
        part
    }

    /// Whether every required field (last field of each chain) is non-empty.
    pub fn required_fields_present(&self, fields: &BTreeMap<String, String>) -> bool {
        self.config.required_fields().iter().all(|name| {
            fields
                .get(*name)
                .is_some_and(|value| !value.trim().is_empty())
        })
    }

    /// Whether `field` feeds the generator.
    pub fn is_source_field(&self, field: &str) -> bool {
        self.config.source_fields().contains(&field)
    }
}

/// Decides when slugs regenerate, and computes regenerated values.
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicyEngine<'a> {
    config: &'a Config,
    uniqueness: UniquenessResolver,
}

impl<'a> SyncPolicyEngine<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            uniqueness: UniquenessResolver::new(config.max_unique_attempts()),
        }
    }

    /// The generator this engine uses.
    pub fn generator(&self) -> SlugGenerator<'a> {
        SlugGenerator::new(self.config)
    }

    /// Sync flag for a node created now.
    pub fn initial_sync_flag(&self) -> bool {
        self.config.sync_enabled() && self.config.sync_default_on()
    }

    /// Global sync feature AND the node's effective sync flag.
    pub fn should_sync<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        node: &Node,
    ) -> Result<bool, StoreError> {
        if !self.config.sync_enabled() {
            return Ok(false);
        }
        Ok(store.counterpart(node)?.sync_enabled)
    }

    /// Auto-trigger rule for source field changes.
    ///
    /// A change to any source field requests regeneration on sync-eligible
    /// nodes and on brand-new nodes, unless a required field is empty.
    pub fn wants_regeneration(
        &self,
        fields: &BTreeMap<String, String>,
        changed: &[String],
        sync_eligible: bool,
        is_new: bool,
    ) -> bool {
        let generator = self.generator();
        let touched = changed.iter().any(|f| generator.is_source_field(f));
        if !touched || !(sync_eligible || is_new) {
            return false;
        }
        if !generator.required_fields_present(fields) {
            tracing::debug!("required source field empty, regeneration suppressed");
            return false;
        }
        true
    }

    /// The slug of `node`'s parent in `node`'s language.
    ///
    /// Returns `None` when the node is not below a site root (the missing
    /// parent context case). Broken chains count as missing context.
    pub fn parent_slug<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        node: &Node,
    ) -> Result<Option<SlugPath>, StoreError> {
        let Some(parent_id) = node.parent_id else {
            return Ok(None);
        };

        let chain = match store.rootline(node) {
            Ok(chain) => chain,
            Err(StoreError::NotFound(id)) | Err(StoreError::Cycle(id)) => {
                tracing::debug!(node = %node.id, at = %id, "ancestor chain unresolved");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if !chain.iter().skip(1).any(|n| n.is_site_root) {
            tracing::debug!(node = %node.id, "no site root above node");
            return Ok(None);
        }

        Ok(store
            .variant_or_default(parent_id, node.language)?
            .map(|parent| parent.slug))
    }

    /// Regenerate `node`'s slug from its source fields.
    ///
    /// Returns `None` (an empty slug) when the site cannot be resolved or
    /// the fields yield nothing; callers keep the current slug then.
    pub fn regenerate<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        node: &Node,
    ) -> Result<Option<SlugPath>, StoreError> {
        let Some(parent) = self.parent_slug(store, node)? else {
            return Ok(None);
        };
        let Some(local) = self.generator().local_part(&node.fields) else {
            return Ok(None);
        };

        let candidate = SlugPath::from_sanitized(naming::join_path(parent.as_str(), &local));
        self.uniqueness
            .ensure_unique_for(store, node, &candidate)
            .map(Some)
    }

    /// Move `node`'s local part from below `old_parent` to below
    /// `new_parent`, without touching the local part itself.
    ///
    /// A slug that does not live below `old_parent` keeps its last segment.
    pub fn reprefix(node: &Node, old_parent: &str, new_parent: &str) -> Option<SlugPath> {
        let local = naming::strip_path_prefix(old_parent, node.slug.as_str())
            .filter(|rest| !rest.is_empty())
            .unwrap_or_else(|| node.slug.last_segment());
        SlugPath::new(naming::join_path(new_parent, local)).ok()
    }

    /// Recompute a slug after the parent path changed.
    ///
    /// Uses the generator when one is configured and yields a value,
    /// otherwise re-prefixes the existing local part. Uniqueness is resolved
    /// against the node's current siblings.
    pub fn recompute<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        node: &Node,
        old_parent: &str,
        new_parent: &str,
    ) -> Result<Option<SlugPath>, StoreError> {
        if self.config.has_generator() {
            if let Some(local) = self.generator().local_part(&node.fields) {
                let candidate = SlugPath::from_sanitized(naming::join_path(new_parent, &local));
                return self
                    .uniqueness
                    .ensure_unique_for(store, node, &candidate)
                    .map(Some);
            }
        }

        self.relocate(store, node, old_parent, new_parent)
    }

    /// Re-prefix `node` below `new_parent` and resolve uniqueness, without
    /// consulting the generator.
    pub fn relocate<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        node: &Node,
        old_parent: &str,
        new_parent: &str,
    ) -> Result<Option<SlugPath>, StoreError> {
        match Self::reprefix(node, old_parent, new_parent) {
            Some(candidate) => self
                .uniqueness
                .ensure_unique_for(store, node, &candidate)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Resolve uniqueness for an explicit candidate.
    pub fn unique<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        node: &Node,
        candidate: &SlugPath,
    ) -> Result<SlugPath, StoreError> {
        self.uniqueness.ensure_unique_for(store, node, candidate)
    }
}

/// An unlock attempt without the unlock permission.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("user '{user}' may not unlock the slug of node {node}")]
pub struct UnlockDenied {
    pub node: NodeId,
    pub user: String,
}

/// Decides lock state and lock changes.
#[derive(Debug, Clone, Copy)]
pub struct LockPolicyEngine<'a> {
    config: &'a Config,
}

impl<'a> LockPolicyEngine<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Global lock feature AND the node's effective lock flag.
    pub fn is_locked<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        node: &Node,
    ) -> Result<bool, StoreError> {
        if !self.config.lock_enabled() {
            return Ok(false);
        }
        Ok(store.counterpart(node)?.locked)
    }

    /// Authorize a requested lock flag.
    ///
    /// Returns the flag to apply (`None` for no change). Clearing a set lock
    /// requires the unlock permission; the payload's claimed state is not
    /// trusted.
    pub fn authorize(
        &self,
        node: &Node,
        requested: Option<bool>,
        auth: &dyn AuthContext,
    ) -> Result<Option<bool>, UnlockDenied> {
        match requested {
            None => Ok(None),
            Some(value) if value == node.locked => Ok(None),
            Some(false) if !auth.can_unlock() => Err(UnlockDenied {
                node: node.id,
                user: auth.user().to_string(),
            }),
            Some(value) => Ok(Some(value)),
        }
    }
}
