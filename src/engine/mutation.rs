//! engine::mutation
//!
//! The host-side mutation pipeline.
//!
//! Every write to a node passes through [`SlugEngine`]:
//!
//! ```text
//! screen flags -> authorize lock -> apply fields -> slug (explicit or
//! regenerated) -> uniqueness -> persist -> redirect -> cascade
//! ```
//!
//! Policy violations on a single field drop that field and surface a
//! [`MutationWarning`]; the rest of the update proceeds. Only an
//! unauthorized unlock rejects the whole update, since the payload's
//! claimed lock state cannot be trusted.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::core::config::Config;
use crate::core::naming;
use crate::core::node::Node;
use crate::core::types::{LanguageId, NodeId, SlugPath};
use crate::engine::cascade::{
    CascadeReport, CascadeUpdateCoordinator, Redirect, RedirectSink, SlugChange,
};
use crate::engine::correlation::CorrelationId;
use crate::engine::permission::{AuthContext, PermissionScopeResolver};
use crate::engine::policy::{LockPolicyEngine, SyncPolicyEngine, UnlockDenied};
use crate::store::{NodeStore, StoreError};

/// Tracing target for audit entries.
pub const AUDIT_TARGET: &str = "slugsync::audit";

/// Errors that reject a whole mutation.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    UnlockDenied(#[from] UnlockDenied),

    #[error("node {0} is deleted")]
    Deleted(NodeId),

    #[error("node {0} is not deleted")]
    NotDeleted(NodeId),

    #[error("node {0} is a translation; {1} its default-language record instead")]
    TranslationTarget(NodeId, &'static str),

    #[error("cannot place node {node} below its own subtree (target {target})")]
    IntoOwnSubtree { node: NodeId, target: NodeId },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Non-fatal findings of a mutation. The affected field was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationWarning {
    #[error(
        "slug '{attempted}' for node {node} leaves the permitted prefix '{locked_prefix}', kept previous value"
    )]
    PermissionViolation {
        node: NodeId,
        attempted: String,
        locked_prefix: String,
    },

    #[error("slug input for node {node} is empty after sanitizing, kept previous value")]
    EmptySlug { node: NodeId },

    #[error("{flag} flag of translation {node} follows its default-language record, ignored")]
    DerivedFlag { node: NodeId, flag: &'static str },

    #[error("{feature} feature is disabled, {feature} flag of node {node} ignored")]
    FeatureDisabled { node: NodeId, feature: &'static str },

    #[error("no slug could be generated for node {node}")]
    NotGenerated { node: NodeId },
}

/// A requested change to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeUpdate {
    pub id: NodeId,
    /// Raw slug input, sanitized before use.
    pub slug: Option<String>,
    /// Source field values to set.
    pub fields: BTreeMap<String, String>,
    pub sync_enabled: Option<bool>,
    pub locked: Option<bool>,
    /// One-time relaxation of last-segment-only for this update.
    pub full_path_override: bool,
}

impl NodeUpdate {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            slug: None,
            fields: BTreeMap::new(),
            sync_enabled: None,
            locked: None,
            full_path_override: false,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_sync(mut self, enabled: bool) -> Self {
        self.sync_enabled = Some(enabled);
        self
    }

    pub fn with_lock(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    pub fn with_full_path_override(mut self) -> Self {
        self.full_path_override = true;
        self
    }
}

/// A node to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNode {
    placement: Placement,
    pub slug: Option<String>,
    pub fields: BTreeMap<String, String>,
    pub sorting: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Child(NodeId),
    Translation(NodeId, LanguageId),
}

impl NewNode {
    /// A default-language node below `parent`.
    pub fn child_of(parent: NodeId) -> Self {
        Self {
            placement: Placement::Child(parent),
            slug: None,
            fields: BTreeMap::new(),
            sorting: 0,
        }
    }

    /// A translation of `default_id` into `language`.
    pub fn translation(default_id: NodeId, language: LanguageId) -> Self {
        Self {
            placement: Placement::Translation(default_id, language),
            slug: None,
            fields: BTreeMap::new(),
            sorting: 0,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_sorting(mut self, sorting: u32) -> Self {
        self.sorting = sorting;
        self
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The node as persisted.
    pub node: Node,
    /// The slug before the mutation.
    pub previous_slug: SlugPath,
    pub warnings: Vec<MutationWarning>,
    pub cascade: CascadeReport,
}

impl UpdateOutcome {
    pub fn slug_changed(&self) -> bool {
        self.node.slug != self.previous_slug
    }
}

/// Applies node mutations under the slug policies.
#[derive(Debug)]
pub struct SlugEngine<S, R> {
    store: S,
    redirects: R,
    config: Config,
}

impl<S: NodeStore, R: RedirectSink> SlugEngine<S, R> {
    pub fn new(store: S, redirects: R, config: Config) -> Self {
        Self {
            store,
            redirects,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn redirects(&self) -> &R {
        &self.redirects
    }

    pub fn into_parts(self) -> (S, R) {
        (self.store, self.redirects)
    }

    /// Apply `update` on behalf of `auth`.
    ///
    /// # Errors
    ///
    /// `MutationError::UnlockDenied` when the update clears a lock without
    /// the unlock permission; store errors otherwise. Permission violations
    /// on the slug are warnings, not errors.
    pub fn process(
        &mut self,
        update: NodeUpdate,
        auth: &dyn AuthContext,
        correlation: &CorrelationId,
    ) -> Result<UpdateOutcome, MutationError> {
        let current = self.store.require(update.id)?;
        if current.deleted {
            return Err(MutationError::Deleted(current.id));
        }

        let mut node = current.clone();
        let mut warnings = Vec::new();
        let (locked, sync_enabled) = self.screen_flags(&node, &update, &mut warnings);

        match LockPolicyEngine::new(&self.config).authorize(&node, locked, auth) {
            Ok(Some(value)) => node.locked = value,
            Ok(None) => {}
            Err(denied) => {
                tracing::warn!(
                    target: AUDIT_TARGET,
                    user = auth.user(),
                    node = %node.id,
                    correlation = %correlation,
                    "unlock without permission rejected"
                );
                return Err(denied.into());
            }
        }

        let sync_turned_on = sync_enabled == Some(true) && !node.sync_enabled;
        if let Some(value) = sync_enabled {
            node.sync_enabled = value;
        }

        let changed: Vec<String> = update
            .fields
            .iter()
            .filter(|(name, value)| node.fields.get(*name) != Some(*value))
            .map(|(name, _)| name.clone())
            .collect();
        node.fields.extend(update.fields);
        node.full_path_override = update.full_path_override;

        if let Some(raw) = update.slug.as_deref() {
            if let Some(slug) = self.screen_slug(&node, raw, auth, correlation, &mut warnings)? {
                node.slug = slug;
            }
        } else if self.regeneration_requested(&node, &changed, sync_turned_on)? {
            match SyncPolicyEngine::new(&self.config).regenerate(&self.store, &node)? {
                Some(slug) => node.slug = slug,
                None => warnings.push(MutationWarning::NotGenerated { node: node.id }),
            }
        }

        node.full_path_override = false;
        let cascade = self.commit(vec![(node.clone(), current.slug.clone())], correlation)?;

        Ok(UpdateOutcome {
            node,
            previous_slug: current.slug,
            warnings,
            cascade,
        })
    }

    /// Drop flag changes that translations or disabled features cannot take.
    fn screen_flags(
        &self,
        node: &Node,
        update: &NodeUpdate,
        warnings: &mut Vec<MutationWarning>,
    ) -> (Option<bool>, Option<bool>) {
        let mut locked = update.locked;
        let mut sync_enabled = update.sync_enabled;

        if node.is_translation() {
            if locked.take().is_some() {
                warnings.push(MutationWarning::DerivedFlag {
                    node: node.id,
                    flag: "lock",
                });
            }
            if sync_enabled.take().is_some() {
                warnings.push(MutationWarning::DerivedFlag {
                    node: node.id,
                    flag: "sync",
                });
            }
        }
        if locked.is_some() && !self.config.lock_enabled() {
            locked = None;
            warnings.push(MutationWarning::FeatureDisabled {
                node: node.id,
                feature: "lock",
            });
        }
        if sync_enabled.is_some() && !self.config.sync_enabled() {
            sync_enabled = None;
            warnings.push(MutationWarning::FeatureDisabled {
                node: node.id,
                feature: "sync",
            });
        }

        for warning in warnings.iter() {
            tracing::warn!(node = %node.id, "{warning}");
        }
        (locked, sync_enabled)
    }

    /// Sanitize and permission-check an explicit slug. `None` drops it.
    fn screen_slug(
        &self,
        node: &Node,
        raw: &str,
        auth: &dyn AuthContext,
        correlation: &CorrelationId,
        warnings: &mut Vec<MutationWarning>,
    ) -> Result<Option<SlugPath>, MutationError> {
        let candidate = SlugPath::from_sanitized(naming::sanitize_path(
            raw,
            self.config.fallback_character(),
        ));
        if candidate.is_root() && !node.is_site_root {
            tracing::warn!(node = %node.id, raw, "slug input sanitized to nothing");
            warnings.push(MutationWarning::EmptySlug { node: node.id });
            return Ok(None);
        }

        let scope = PermissionScopeResolver::scope(&self.store, &self.config, auth, node)?;
        if !scope.allows(node.slug.as_str(), candidate.as_str()) {
            tracing::warn!(
                target: AUDIT_TARGET,
                user = auth.user(),
                node = %node.id,
                previous = %node.slug,
                attempted = %candidate,
                locked_prefix = %scope.locked_prefix,
                correlation = %correlation,
                "slug change outside permitted prefix rejected"
            );
            warnings.push(MutationWarning::PermissionViolation {
                node: node.id,
                attempted: candidate.to_string(),
                locked_prefix: scope.locked_prefix,
            });
            return Ok(None);
        }

        if candidate == node.slug {
            return Ok(Some(candidate));
        }
        let unique = SyncPolicyEngine::new(&self.config).unique(&self.store, node, &candidate)?;
        Ok(Some(unique))
    }

    fn regeneration_requested(
        &self,
        node: &Node,
        changed: &[String],
        sync_turned_on: bool,
    ) -> Result<bool, StoreError> {
        if LockPolicyEngine::new(&self.config).is_locked(&self.store, node)? {
            return Ok(false);
        }
        let sync = SyncPolicyEngine::new(&self.config);
        let eligible = sync.should_sync(&self.store, node)?;
        if sync_turned_on && eligible {
            return Ok(sync.generator().required_fields_present(&node.fields));
        }
        Ok(sync.wants_regeneration(&node.fields, changed, eligible, false))
    }

    /// Create a node, deriving its slug from the source fields unless an
    /// explicit slug is given.
    ///
    /// Without a resolvable site the slug is the bare local part.
    pub fn create(
        &mut self,
        new: NewNode,
        auth: &dyn AuthContext,
        correlation: &CorrelationId,
    ) -> Result<UpdateOutcome, MutationError> {
        let id = self.store.next_id()?;
        let sync = SyncPolicyEngine::new(&self.config);

        let mut node = match new.placement {
            Placement::Child(parent) => {
                self.store.require(parent)?;
                let mut node = Node::new(id, Some(parent), SlugPath::root());
                node.sync_enabled = sync.initial_sync_flag();
                node
            }
            Placement::Translation(default_id, language) => {
                let original = self.store.require(default_id)?;
                if original.is_translation() {
                    return Err(MutationError::TranslationTarget(default_id, "translate"));
                }
                let mut node = Node::new(id, original.parent_id, SlugPath::root())
                    .translating(default_id, language);
                node.sync_enabled = original.sync_enabled;
                node.locked = original.locked;
                node
            }
        };
        node.sorting = new.sorting;
        node.fields = new.fields;

        let mut warnings = Vec::new();
        let parent_slug = sync.parent_slug(&self.store, &node)?;
        let base = parent_slug.as_ref().map(SlugPath::as_str).unwrap_or("");
        let all_fields: Vec<String> = node.fields.keys().cloned().collect();
        let eligible = sync.should_sync(&self.store, &node)?;

        let local = if sync.wants_regeneration(&node.fields, &all_fields, eligible, true) {
            sync.generator().local_part(&node.fields)
        } else {
            None
        };
        let local = local.unwrap_or_else(|| {
            warnings.push(MutationWarning::NotGenerated { node: id });
            id.to_string()
        });
        node.slug = SlugPath::from_sanitized(naming::join_path(base, &local));

        if let Some(raw) = new.slug.as_deref() {
            if let Some(slug) = self.screen_slug(&node, raw, auth, correlation, &mut warnings)? {
                node.slug = slug;
            }
        }
        node.slug = sync.unique(&self.store, &node, &node.slug)?;

        self.store.save(node.clone())?;
        tracing::info!(node = %id, slug = %node.slug, correlation = %correlation, "node created");

        Ok(UpdateOutcome {
            previous_slug: node.slug.clone(),
            node,
            warnings,
            cascade: CascadeReport::default(),
        })
    }

    /// Move a node (and its translations) below `new_parent`.
    ///
    /// Slugs are recomputed against the new parent: regenerated when sync
    /// applies, re-prefixed otherwise. Locked slugs only take a uniqueness
    /// suffix if they collide. The subtree follows through the cascade.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        correlation: &CorrelationId,
    ) -> Result<UpdateOutcome, MutationError> {
        let node = self.require_default(id, "move")?;
        let target = self.store.require(new_parent)?;
        let target_chain = self.store.rootline(&target)?;
        if target_chain.iter().any(|n| n.default_id() == id) {
            return Err(MutationError::IntoOwnSubtree {
                node: id,
                target: new_parent,
            });
        }

        let mut records = vec![node];
        records.extend(self.store.translations(id)?);

        let old_parents: Vec<String> = records
            .iter()
            .map(|r| self.parent_path_of(r))
            .collect::<Result<_, _>>()?;

        let mut placed = Vec::with_capacity(records.len());
        for (mut record, old_parent) in records.into_iter().zip(old_parents) {
            let previous = record.slug.clone();
            record.parent_id = Some(new_parent);
            record.slug = self.placed_slug(&record, &old_parent)?;
            placed.push((record, previous));
        }

        let (node, previous_slug) = placed[0].clone();
        let cascade = self.commit(placed, correlation)?;
        tracing::info!(node = %id, parent = %new_parent, slug = %node.slug, "node moved");

        Ok(UpdateOutcome {
            node,
            previous_slug,
            warnings: Vec::new(),
            cascade,
        })
    }

    /// Copy a single node (and its translations) below `new_parent`.
    pub fn copy_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        correlation: &CorrelationId,
    ) -> Result<UpdateOutcome, MutationError> {
        let original = self.require_default(id, "copy")?;
        self.store.require(new_parent)?;

        let mut records = vec![original];
        records.extend(self.store.translations(id)?);

        let copy_id = self.store.next_id()?;
        let mut copies = Vec::with_capacity(records.len());
        for record in records {
            let old_parent = self.parent_path_of(&record)?;
            let mut copy = record;
            copy.id = if copy.is_translation() {
                self.store.next_id()?
            } else {
                copy_id
            };
            if copy.is_translation() {
                copy.translation_of = Some(copy_id);
            }
            copy.parent_id = Some(new_parent);
            copy.slug = self.placed_slug(&copy, &old_parent)?;
            self.store.save(copy.clone())?;
            copies.push(copy);
        }

        let node = copies.swap_remove(0);
        tracing::info!(
            source = %id,
            node = %node.id,
            slug = %node.slug,
            correlation = %correlation,
            "node copied"
        );
        Ok(UpdateOutcome {
            previous_slug: node.slug.clone(),
            node,
            warnings: Vec::new(),
            cascade: CascadeReport::default(),
        })
    }

    /// Soft-delete a node, its translations and its whole subtree.
    ///
    /// Returns the ids of every record marked deleted.
    pub fn delete(&mut self, id: NodeId) -> Result<Vec<NodeId>, MutationError> {
        self.require_default(id, "delete")?;

        let mut deleted = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let mut records = vec![self.store.require(current)?];
            records.extend(self.store.translations(current)?);
            for mut record in records {
                if !record.deleted {
                    record.deleted = true;
                    deleted.push(record.id);
                    self.store.save(record)?;
                }
            }
            queue.extend(
                self.store
                    .children(current, LanguageId::DEFAULT)?
                    .into_iter()
                    .map(|c| c.id),
            );
        }

        tracing::info!(node = %id, records = deleted.len(), "subtree deleted");
        Ok(deleted)
    }

    /// Restore a soft-deleted node and its translations.
    ///
    /// Slugs that now collide with a live sibling take a numeric suffix.
    pub fn restore(
        &mut self,
        id: NodeId,
        correlation: &CorrelationId,
    ) -> Result<UpdateOutcome, MutationError> {
        let node = self.require_default_any(id, "restore")?;
        if !node.deleted {
            return Err(MutationError::NotDeleted(id));
        }

        let mut records = vec![node];
        records.extend(self.store.find(&|n: &Node| n.translation_of == Some(id) && n.deleted)?);

        let sync = SyncPolicyEngine::new(&self.config);
        let mut restored = Vec::with_capacity(records.len());
        for mut record in records {
            let previous = record.slug.clone();
            record.deleted = false;
            record.slug = sync.unique(&self.store, &record, &record.slug)?;
            restored.push((record, previous));
        }

        let (node, previous_slug) = restored[0].clone();
        let cascade = self.commit(restored, correlation)?;
        tracing::info!(node = %id, slug = %node.slug, "node restored");

        Ok(UpdateOutcome {
            node,
            previous_slug,
            warnings: Vec::new(),
            cascade,
        })
    }

    /// Persist a slug computed by the cascade.
    pub(crate) fn write_derived(
        &mut self,
        mut node: Node,
        slug: SlugPath,
        correlation: &CorrelationId,
    ) -> Result<SlugChange, StoreError> {
        let old = std::mem::replace(&mut node.slug, slug);
        let change = SlugChange {
            node: node.id,
            language: node.language,
            old: old.clone(),
            new: node.slug.clone(),
        };
        let nested = self.commit(vec![(node, old)], correlation)?;
        debug_assert!(nested.is_empty(), "cascade write started another cascade");
        Ok(change)
    }

    /// Save records, hand off slug transitions and cascade from the changed
    /// ones. A changed default-language record covers its translations.
    fn commit(
        &mut self,
        records: Vec<(Node, SlugPath)>,
        correlation: &CorrelationId,
    ) -> Result<CascadeReport, StoreError> {
        let mut old_slugs = HashMap::new();
        let mut changed = Vec::new();

        for (node, previous) in records {
            self.store.save(node.clone())?;
            if node.slug != previous {
                tracing::info!(
                    node = %node.id,
                    from = %previous,
                    to = %node.slug,
                    correlation = %correlation,
                    "slug changed"
                );
                self.redirects.redirect(Redirect {
                    node: node.id,
                    language: node.language,
                    from: previous.clone(),
                    to: node.slug.clone(),
                });
                old_slugs.insert(node.id, previous);
                changed.push(node);
            }
        }

        let mut report = CascadeReport::default();
        let triggers: Vec<Node> = match changed.iter().find(|n| !n.is_translation()) {
            Some(default) => vec![default.clone()],
            None => changed,
        };
        for trigger in triggers {
            let run =
                CascadeUpdateCoordinator::run(self, &trigger, old_slugs.clone(), correlation);
            report.absorb(run);
        }
        Ok(report)
    }

    fn require_default(&self, id: NodeId, action: &'static str) -> Result<Node, MutationError> {
        let node = self.require_default_any(id, action)?;
        if node.deleted {
            return Err(MutationError::Deleted(id));
        }
        Ok(node)
    }

    fn require_default_any(
        &self,
        id: NodeId,
        action: &'static str,
    ) -> Result<Node, MutationError> {
        let node = self.store.require(id)?;
        if node.is_translation() {
            return Err(MutationError::TranslationTarget(id, action));
        }
        Ok(node)
    }

    /// Slug of `node`'s current parent in its language, `""` if none.
    fn parent_path_of(&self, node: &Node) -> Result<String, StoreError> {
        Ok(match node.parent_id {
            Some(parent) => self
                .store
                .variant_or_default(parent, node.language)?
                .map(|p| p.slug.as_str().to_string())
                .unwrap_or_default(),
            None => String::new(),
        })
    }

    /// The slug of `record` after placing it below its (new) parent.
    fn placed_slug(&self, record: &Node, old_parent: &str) -> Result<SlugPath, StoreError> {
        let sync = SyncPolicyEngine::new(&self.config);
        let lock = LockPolicyEngine::new(&self.config);

        if lock.is_locked(&self.store, record)? {
            return sync.unique(&self.store, record, &record.slug);
        }
        let Some(new_parent) = sync.parent_slug(&self.store, record)? else {
            tracing::debug!(node = %record.id, "no site below new parent, slug kept");
            return sync.unique(&self.store, record, &record.slug);
        };

        let placed = if sync.should_sync(&self.store, record)? {
            sync.recompute(&self.store, record, old_parent, new_parent.as_str())?
        } else {
            sync.relocate(&self.store, record, old_parent, new_parent.as_str())?
        };
        match placed {
            Some(slug) => Ok(slug),
            None => sync.unique(&self.store, record, &record.slug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cascade::{NoRedirects, RecordingRedirects};
    use crate::engine::permission::{StaticAuth, SystemAuth};
    use crate::store::MemoryStore;

    fn slug(s: &str) -> SlugPath {
        SlugPath::new(s).unwrap()
    }

    fn id(n: u64) -> NodeId {
        NodeId::new(n)
    }

    /// root(1) -> parent-section(2) -> old-child(3) -> leaf(4)
    ///         -> archive(5)
    fn store() -> MemoryStore {
        MemoryStore::from_nodes([
            Node::site_root(id(1)),
            Node::new(id(2), Some(id(1)), slug("/parent-section"))
                .with_field("title", "Parent Section")
                .with_sync(true),
            Node::new(id(3), Some(id(2)), slug("/parent-section/old-child"))
                .with_field("title", "Old Child")
                .with_sync(true),
            Node::new(id(4), Some(id(3)), slug("/parent-section/old-child/leaf"))
                .with_field("title", "Leaf")
                .with_sync(true),
            Node::new(id(5), Some(id(1)), slug("/archive")).with_field("title", "Archive"),
        ])
    }

    fn engine() -> SlugEngine<MemoryStore, RecordingRedirects> {
        SlugEngine::new(store(), RecordingRedirects::default(), Config::default())
    }

    fn slug_of(engine: &SlugEngine<MemoryStore, RecordingRedirects>, node: u64) -> String {
        engine.store().require(id(node)).unwrap().slug.to_string()
    }

    mod process {
        use super::*;

        #[test]
        fn edit_outside_locked_prefix_is_dropped() {
            let mut engine = engine();
            let editor = StaticAuth::editor("ed", [id(3)]);

            let outcome = engine
                .process(
                    NodeUpdate::new(id(3))
                        .with_slug("/different-parent/child")
                        .with_field("abstract", "kept"),
                    &editor,
                    &CorrelationId::new(),
                )
                .unwrap();

            assert_eq!(outcome.node.slug, slug("/parent-section/old-child"));
            assert_eq!(outcome.node.field("abstract"), Some("kept"));
            assert_eq!(
                outcome.warnings,
                vec![MutationWarning::PermissionViolation {
                    node: id(3),
                    attempted: "/different-parent/child".into(),
                    locked_prefix: "/parent-section".into(),
                }]
            );
            assert!(!outcome.slug_changed());
        }

        #[test]
        fn edit_inside_locked_prefix_is_sanitized_and_applied() {
            let mut engine = engine();
            let editor = StaticAuth::editor("ed", [id(3)]);

            let outcome = engine
                .process(
                    NodeUpdate::new(id(3)).with_slug("/parent-section/New Child!"),
                    &editor,
                    &CorrelationId::new(),
                )
                .unwrap();

            assert_eq!(outcome.node.slug, slug("/parent-section/new-child"));
            assert_eq!(slug_of(&engine, 4), "/parent-section/new-child/leaf");
        }

        #[test]
        fn explicit_collision_is_suffixed() {
            let mut engine = engine();
            let outcome = engine
                .process(
                    NodeUpdate::new(id(5)).with_slug("/parent-section"),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();
            assert_eq!(outcome.node.slug, slug("/parent-section-1"));
        }

        #[test]
        fn empty_slug_input_is_dropped() {
            let mut engine = engine();
            let outcome = engine
                .process(
                    NodeUpdate::new(id(5)).with_slug("/?!/"),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();
            assert_eq!(outcome.node.slug, slug("/archive"));
            assert_eq!(outcome.warnings, vec![MutationWarning::EmptySlug { node: id(5) }]);
        }

        #[test]
        fn unlock_without_permission_rejects_update() {
            let mut engine = engine();
            let mut node = engine.store().require(id(3)).unwrap();
            node.locked = true;
            engine.store_mut().save(node).unwrap();

            let editor = StaticAuth::editor("ed", [id(3)]);
            let err = engine
                .process(
                    NodeUpdate::new(id(3))
                        .with_lock(false)
                        .with_field("title", "Sneaky"),
                    &editor,
                    &CorrelationId::new(),
                )
                .unwrap_err();

            assert!(matches!(err, MutationError::UnlockDenied(_)));
            let stored = engine.store().require(id(3)).unwrap();
            assert!(stored.locked);
            assert_eq!(stored.field("title"), Some("Old Child"));
        }

        #[test]
        fn source_field_change_regenerates_synced_node() {
            let mut engine = engine();
            let outcome = engine
                .process(
                    NodeUpdate::new(id(3)).with_field("title", "Fresh Name"),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();

            assert_eq!(outcome.node.slug, slug("/parent-section/fresh-name"));
            assert_eq!(
                outcome.cascade.slug_of(id(4)),
                Some(&slug("/parent-section/fresh-name/leaf"))
            );
        }

        #[test]
        fn source_field_change_leaves_unsynced_node() {
            let mut engine = engine();
            let outcome = engine
                .process(
                    NodeUpdate::new(id(5)).with_field("title", "Old Stuff"),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();
            assert_eq!(outcome.node.slug, slug("/archive"));
        }

        #[test]
        fn empty_required_field_suppresses_regeneration() {
            let mut engine = engine();
            let outcome = engine
                .process(
                    NodeUpdate::new(id(3)).with_field("title", ""),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();
            assert_eq!(outcome.node.slug, slug("/parent-section/old-child"));
        }

        #[test]
        fn locked_node_does_not_regenerate() {
            let mut engine = engine();
            let outcome = engine
                .process(
                    NodeUpdate::new(id(3))
                        .with_lock(true)
                        .with_field("title", "Elsewhere"),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();
            assert!(outcome.node.locked);
            assert_eq!(outcome.node.slug, slug("/parent-section/old-child"));
        }

        #[test]
        fn turning_sync_on_regenerates() {
            let mut engine = engine();
            let outcome = engine
                .process(
                    NodeUpdate::new(id(5)).with_sync(true),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();
            assert!(outcome.node.sync_enabled);
            assert_eq!(outcome.node.slug, slug("/archive"));

            let mut engine = self::engine();
            let mut archive = engine.store().require(id(5)).unwrap();
            archive.slug = slug("/hand-made");
            engine.store_mut().save(archive).unwrap();

            let outcome = engine
                .process(
                    NodeUpdate::new(id(5)).with_sync(true),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();
            assert_eq!(outcome.node.slug, slug("/archive"));
        }

        #[test]
        fn translation_flags_are_dropped() {
            let mut engine = engine();
            engine
                .store_mut()
                .save(
                    Node::new(id(30), Some(id(2)), slug("/abschnitt/kind"))
                        .translating(id(3), LanguageId::new(1)),
                )
                .unwrap();

            let outcome = engine
                .process(
                    NodeUpdate::new(id(30)).with_lock(true).with_sync(false),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();

            assert!(!outcome.node.locked);
            assert_eq!(outcome.warnings.len(), 2);
            assert!(matches!(
                outcome.warnings[0],
                MutationWarning::DerivedFlag { flag: "lock", .. }
            ));
        }

        #[test]
        fn disabled_lock_feature_drops_flag() {
            let config = Config::from_toml_str("[lock]\nenabled = false\n").unwrap();
            let mut engine = SlugEngine::new(store(), NoRedirects, config);
            let outcome = engine
                .process(
                    NodeUpdate::new(id(5)).with_lock(true),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();
            assert!(!outcome.node.locked);
            assert_eq!(
                outcome.warnings,
                vec![MutationWarning::FeatureDisabled {
                    node: id(5),
                    feature: "lock"
                }]
            );
        }

        #[test]
        fn full_path_override_is_never_persisted() {
            let config =
                Config::from_toml_str("[permissions]\nlast_segment_only = true\n").unwrap();
            let mut engine = SlugEngine::new(store(), NoRedirects, config);
            let editor = StaticAuth::editor("ed", [id(2), id(3), id(4)]);

            let outcome = engine
                .process(
                    NodeUpdate::new(id(4))
                        .with_slug("/parent-section/flat-leaf")
                        .with_full_path_override(),
                    &editor,
                    &CorrelationId::new(),
                )
                .unwrap();

            assert_eq!(outcome.node.slug, slug("/parent-section/flat-leaf"));
            assert!(!engine.store().require(id(4)).unwrap().full_path_override);

            let outcome = engine
                .process(
                    NodeUpdate::new(id(4)).with_slug("/elsewhere/leaf"),
                    &editor,
                    &CorrelationId::new(),
                )
                .unwrap();
            assert!(!outcome.warnings.is_empty());
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn create_derives_slug_from_fields() {
            let mut engine = engine();
            let outcome = engine
                .create(
                    NewNode::child_of(id(2)).with_field("title", "Old Child"),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();

            assert_eq!(outcome.node.id, id(6));
            assert!(outcome.node.sync_enabled);
            assert_eq!(outcome.node.slug, slug("/parent-section/old-child-1"));
        }

        #[test]
        fn create_without_fields_uses_id() {
            let mut engine = engine();
            let outcome = engine
                .create(NewNode::child_of(id(1)), &SystemAuth, &CorrelationId::new())
                .unwrap();
            assert_eq!(outcome.node.slug, slug("/6"));
            assert_eq!(outcome.warnings, vec![MutationWarning::NotGenerated { node: id(6) }]);
        }

        #[test]
        fn create_translation_uses_translated_parent() {
            let mut engine = engine();
            let de = LanguageId::new(1);
            engine
                .create(
                    NewNode::translation(id(2), de).with_field("title", "Abschnitt"),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();
            let outcome = engine
                .create(
                    NewNode::translation(id(3), de).with_field("title", "Kind"),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();

            assert_eq!(outcome.node.slug, slug("/abschnitt/kind"));
            assert_eq!(outcome.node.parent_id, Some(id(2)));
        }

        #[test]
        fn move_recomputes_and_cascades() {
            let mut engine = engine();
            let outcome = engine.move_node(id(3), id(5), &CorrelationId::new()).unwrap();

            assert_eq!(outcome.node.slug, slug("/archive/old-child"));
            assert_eq!(slug_of(&engine, 4), "/archive/old-child/leaf");
        }

        #[test]
        fn move_below_own_subtree_is_rejected() {
            let mut engine = engine();
            let err = engine.move_node(id(2), id(4), &CorrelationId::new()).unwrap_err();
            assert!(matches!(err, MutationError::IntoOwnSubtree { .. }));
        }

        #[test]
        fn copy_resolves_collision() {
            let mut engine = engine();
            let outcome = engine.copy_node(id(3), id(2), &CorrelationId::new()).unwrap();

            assert_eq!(outcome.node.id, id(6));
            assert_eq!(outcome.node.slug, slug("/parent-section/old-child-1"));
            assert_eq!(slug_of(&engine, 3), "/parent-section/old-child");
        }

        #[test]
        fn delete_and_restore_resolve_uniqueness() {
            let mut engine = engine();
            let deleted = engine.delete(id(3)).unwrap();
            assert_eq!(deleted, vec![id(3), id(4)]);

            engine
                .create(
                    NewNode::child_of(id(2)).with_field("title", "Old Child"),
                    &SystemAuth,
                    &CorrelationId::new(),
                )
                .unwrap();

            let outcome = engine.restore(id(3), &CorrelationId::new()).unwrap();
            assert!(!outcome.node.deleted);
            assert_eq!(outcome.node.slug, slug("/parent-section/old-child-1"));
            assert!(engine.store().require(id(4)).unwrap().deleted);
        }

        #[test]
        fn restore_live_node_fails() {
            let mut engine = engine();
            assert!(matches!(
                engine.restore(id(3), &CorrelationId::new()),
                Err(MutationError::NotDeleted(_))
            ));
        }
    }
}
