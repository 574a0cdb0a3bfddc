//! engine::cascade
//!
//! Propagation of a slug change through the descendants of a node.
//!
//! # Algorithm
//!
//! A worklist is seeded with the trigger's live children in stable order
//! (sorting, then id). Each default-language child fans out to its live
//! translations; a translation trigger only visits its own language. Every
//! visited node is either updated, and its children enqueued, or skipped:
//!
//! - **Locked**: the lock freezes the node's slug.
//! - **NotSynced**: sync is off (or globally disabled).
//! - **MissingSite**: the ancestor chain has no site root.
//! - **Unchanged**: the recomputed slug equals the current one.
//!
//! Locked and not-synced nodes only freeze themselves: their children are
//! still visited and rebuilt below the frozen slug. Unchanged and
//! missing-site nodes end the walk for their subtree. A visited set guards
//! against malformed parent pointers.
//!
//! Writes go through the mutation pipeline with the cascade aspect set on
//! the correlation id, so nothing written here starts another cascade.
//! Store errors on a descendant are recorded in the report and never fail
//! the triggering operation.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::node::Node;
use crate::core::types::{LanguageId, NodeId, SlugPath};
use crate::engine::correlation::{CorrelationId, ReentrancyGuard, CASCADE_ASPECT};
use crate::engine::mutation::SlugEngine;
use crate::engine::policy::{LockPolicyEngine, SyncPolicyEngine};
use crate::store::{NodeStore, StoreError};

/// One redirect hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub node: NodeId,
    pub language: LanguageId,
    pub from: SlugPath,
    pub to: SlugPath,
}

/// Receives old -> new slug transitions.
///
/// Redirect creation itself belongs to the host system.
pub trait RedirectSink {
    fn redirect(&mut self, redirect: Redirect);
}

/// Discards every transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRedirects;

impl RedirectSink for NoRedirects {
    fn redirect(&mut self, _redirect: Redirect) {}
}

/// Keeps every transition in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingRedirects {
    pub redirects: Vec<Redirect>,
}

impl RedirectSink for RecordingRedirects {
    fn redirect(&mut self, redirect: Redirect) {
        self.redirects.push(redirect);
    }
}

/// A persisted slug change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugChange {
    pub node: NodeId,
    pub language: LanguageId,
    pub old: SlugPath,
    pub new: SlugPath,
}

/// Why a visited node kept its slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Locked,
    NotSynced,
    MissingSite,
    Unchanged,
}

impl SkipReason {
    /// Whether the children of a node skipped for this reason are visited.
    pub fn descends(self) -> bool {
        matches!(self, SkipReason::Locked | SkipReason::NotSynced)
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::Locked => "locked",
            SkipReason::NotSynced => "sync off",
            SkipReason::MissingSite => "no site root",
            SkipReason::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// A visited node that kept its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub node: NodeId,
    pub reason: SkipReason,
}

/// A descendant that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeFailure {
    pub node: NodeId,
    pub message: String,
}

/// Result of one cascade run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub updated: Vec<SlugChange>,
    pub skipped: Vec<Skipped>,
    pub errors: Vec<CascadeFailure>,
}

impl CascadeReport {
    /// Whether the run touched nothing.
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.skipped.is_empty() && self.errors.is_empty()
    }

    /// The new slug of `node`, if the run changed it.
    pub fn slug_of(&self, node: NodeId) -> Option<&SlugPath> {
        self.updated
            .iter()
            .find(|change| change.node == node)
            .map(|change| &change.new)
    }

    /// The skip reason recorded for `node`.
    pub fn skip_reason(&self, node: NodeId) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|s| s.node == node)
            .map(|s| s.reason)
    }

    pub(crate) fn absorb(&mut self, other: CascadeReport) {
        self.updated.extend(other.updated);
        self.skipped.extend(other.skipped);
        self.errors.extend(other.errors);
    }
}

enum Visit {
    Updated(SlugChange, Node),
    Skipped(SkipReason, Node),
}

/// Runs cascades on behalf of a [`SlugEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeUpdateCoordinator;

impl CascadeUpdateCoordinator {
    /// Propagate the slug change of `trigger` to its descendants.
    ///
    /// `old_slugs` maps record ids to their slug before the triggering
    /// operation; it must contain at least the trigger. Returns an empty
    /// report when `correlation` was itself spawned by a cascade.
    pub fn run<S: NodeStore, R: RedirectSink>(
        engine: &mut SlugEngine<S, R>,
        trigger: &Node,
        mut old_slugs: HashMap<NodeId, SlugPath>,
        correlation: &CorrelationId,
    ) -> CascadeReport {
        let mut report = CascadeReport::default();
        if !ReentrancyGuard::may_cascade(correlation) {
            return report;
        }

        let spawned = correlation.derive(CASCADE_ASPECT);
        let only_language = trigger.is_translation().then_some(trigger.language);
        let mut visited = HashSet::from([trigger.id]);
        let mut queue = VecDeque::new();

        tracing::debug!(
            node = %trigger.id,
            correlation = %correlation,
            "starting slug cascade"
        );

        if let Err(e) = enqueue_children(engine.store(), trigger, only_language, &mut queue) {
            record_failure(&mut report, trigger.id, &e);
            return report;
        }

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }

            match visit(engine, id, &old_slugs, &spawned) {
                Ok(Visit::Updated(change, node)) => {
                    old_slugs.insert(id, change.old.clone());
                    report.updated.push(change);
                    if let Err(e) =
                        enqueue_children(engine.store(), &node, only_language, &mut queue)
                    {
                        record_failure(&mut report, id, &e);
                    }
                }
                Ok(Visit::Skipped(reason, node)) => {
                    tracing::debug!(node = %id, %reason, "cascade skipped node");
                    report.skipped.push(Skipped { node: id, reason });
                    if reason.descends() {
                        if let Err(e) =
                            enqueue_children(engine.store(), &node, only_language, &mut queue)
                        {
                            record_failure(&mut report, id, &e);
                        }
                    }
                }
                Err(e) => record_failure(&mut report, id, &e),
            }
        }

        tracing::debug!(
            node = %trigger.id,
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "slug cascade finished"
        );
        report
    }
}

fn enqueue_children<S: NodeStore + ?Sized>(
    store: &S,
    node: &Node,
    only_language: Option<LanguageId>,
    queue: &mut VecDeque<NodeId>,
) -> Result<(), StoreError> {
    for child in store.children(node.default_id(), node.language)? {
        queue.push_back(child.id);
        if only_language.is_none() && !child.is_translation() {
            queue.extend(store.translations(child.id)?.into_iter().map(|t| t.id));
        }
    }
    Ok(())
}

fn visit<S: NodeStore, R: RedirectSink>(
    engine: &mut SlugEngine<S, R>,
    id: NodeId,
    old_slugs: &HashMap<NodeId, SlugPath>,
    correlation: &CorrelationId,
) -> Result<Visit, StoreError> {
    let node = engine.store().require(id)?;
    let config = engine.config();
    let store = engine.store();

    if LockPolicyEngine::new(config).is_locked(store, &node)? {
        return Ok(Visit::Skipped(SkipReason::Locked, node));
    }
    let sync = SyncPolicyEngine::new(config);
    if !sync.should_sync(store, &node)? {
        return Ok(Visit::Skipped(SkipReason::NotSynced, node));
    }
    let Some(new_parent) = sync.parent_slug(store, &node)? else {
        return Ok(Visit::Skipped(SkipReason::MissingSite, node));
    };

    let old_parent = match node.parent_id {
        Some(parent_id) => store
            .variant_or_default(parent_id, node.language)?
            .map(|parent| {
                old_slugs
                    .get(&parent.id)
                    .cloned()
                    .unwrap_or(parent.slug)
            })
            .unwrap_or_else(|| new_parent.clone()),
        None => new_parent.clone(),
    };

    let Some(new_slug) = sync.recompute(store, &node, old_parent.as_str(), new_parent.as_str())?
    else {
        return Ok(Visit::Skipped(SkipReason::MissingSite, node));
    };
    if new_slug == node.slug {
        return Ok(Visit::Skipped(SkipReason::Unchanged, node));
    }

    let change = engine.write_derived(node, new_slug, correlation)?;
    let node = engine.store().require(id)?;
    Ok(Visit::Updated(change, node))
}

fn record_failure(report: &mut CascadeReport, node: NodeId, error: &StoreError) {
    tracing::warn!(node = %node, error = %error, "cascade could not process node");
    report.errors.push(CascadeFailure {
        node,
        message: error.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::engine::permission::SystemAuth;
    use crate::engine::mutation::NodeUpdate;
    use crate::store::MemoryStore;

    fn slug(s: &str) -> SlugPath {
        SlugPath::new(s).unwrap()
    }

    fn id(n: u64) -> NodeId {
        NodeId::new(n)
    }

    /// root(1) -> shop(2) -> shoes(3) -> sneakers(4)
    ///                    -> boots(5, locked) -> winter(6)
    fn engine() -> SlugEngine<MemoryStore, RecordingRedirects> {
        let store = MemoryStore::from_nodes([
            Node::site_root(id(1)),
            Node::new(id(2), Some(id(1)), slug("/shop"))
                .with_field("title", "Shop")
                .with_sync(true),
            Node::new(id(3), Some(id(2)), slug("/shop/shoes"))
                .with_field("title", "Shoes")
                .with_sync(true)
                .with_sorting(1),
            Node::new(id(4), Some(id(3)), slug("/shop/shoes/sneakers"))
                .with_field("title", "Sneakers")
                .with_sync(true),
            Node::new(id(5), Some(id(2)), slug("/shop/boots"))
                .with_field("title", "Boots")
                .with_sync(true)
                .with_lock(true)
                .with_sorting(2),
            Node::new(id(6), Some(id(5)), slug("/shop/boots/winter"))
                .with_field("title", "Winter")
                .with_sync(true),
        ]);
        SlugEngine::new(store, RecordingRedirects::default(), Config::default())
    }

    fn rename(engine: &mut SlugEngine<MemoryStore, RecordingRedirects>, node: u64, to: &str) {
        engine
            .process(
                NodeUpdate::new(id(node)).with_slug(to),
                &SystemAuth,
                &CorrelationId::new(),
            )
            .unwrap();
    }

    fn slug_of(engine: &SlugEngine<MemoryStore, RecordingRedirects>, node: u64) -> String {
        engine.store().require(id(node)).unwrap().slug.as_str().to_string()
    }

    #[test]
    fn descendants_follow_renamed_parent() {
        let mut engine = engine();
        rename(&mut engine, 2, "/store");

        assert_eq!(slug_of(&engine, 3), "/store/shoes");
        assert_eq!(slug_of(&engine, 4), "/store/shoes/sneakers");
    }

    #[test]
    fn locked_node_and_its_subtree_keep_slugs() {
        let mut engine = engine();
        rename(&mut engine, 2, "/store");

        assert_eq!(slug_of(&engine, 5), "/shop/boots");
        assert_eq!(slug_of(&engine, 6), "/shop/boots/winter");
    }

    #[test]
    fn report_lists_updates_and_skips() {
        let mut engine = engine();
        let node = engine.store().require(id(2)).unwrap();
        let mut moved = node.clone();
        moved.slug = slug("/store");
        engine.store_mut().save(moved.clone()).unwrap();

        let report = CascadeUpdateCoordinator::run(
            &mut engine,
            &moved,
            HashMap::from([(id(2), slug("/shop"))]),
            &CorrelationId::new(),
        );

        assert_eq!(report.slug_of(id(3)), Some(&slug("/store/shoes")));
        assert_eq!(report.slug_of(id(4)), Some(&slug("/store/shoes/sneakers")));
        assert_eq!(report.skip_reason(id(5)), Some(SkipReason::Locked));
        assert_eq!(report.skip_reason(id(6)), Some(SkipReason::Unchanged));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn spawned_correlation_does_not_cascade() {
        let mut engine = engine();
        let node = engine.store().require(id(2)).unwrap();
        let report = CascadeUpdateCoordinator::run(
            &mut engine,
            &node,
            HashMap::from([(id(2), slug("/old"))]),
            &CorrelationId::new().derive(CASCADE_ASPECT),
        );
        assert!(report.is_empty());
    }

    #[test]
    fn not_synced_child_is_skipped() {
        let mut engine = engine();
        let mut shoes = engine.store().require(id(3)).unwrap();
        shoes.sync_enabled = false;
        engine.store_mut().save(shoes).unwrap();

        rename(&mut engine, 2, "/store");
        assert_eq!(slug_of(&engine, 3), "/shop/shoes");
        assert_eq!(slug_of(&engine, 4), "/shop/shoes/sneakers");
    }

    #[test]
    fn synced_child_below_locked_node_is_rebuilt() {
        let store = MemoryStore::from_nodes([
            Node::site_root(id(1)),
            Node::new(id(2), Some(id(1)), slug("/a")).with_sync(true),
            Node::new(id(3), Some(id(2)), slug("/a/l"))
                .with_field("title", "L")
                .with_lock(true),
            Node::new(id(4), Some(id(3)), slug("/a/l/old"))
                .with_field("title", "New")
                .with_sync(true),
        ]);
        let mut engine = SlugEngine::new(store, RecordingRedirects::default(), Config::default());

        let outcome = engine
            .process(
                NodeUpdate::new(id(2)).with_slug("/b"),
                &SystemAuth,
                &CorrelationId::new(),
            )
            .unwrap();

        assert_eq!(outcome.cascade.skip_reason(id(3)), Some(SkipReason::Locked));
        assert_eq!(slug_of(&engine, 3), "/a/l");
        assert_eq!(slug_of(&engine, 4), "/a/l/new");
        assert_eq!(outcome.cascade.slug_of(id(4)), Some(&slug("/a/l/new")));
    }

    #[test]
    fn redirects_are_handed_off() {
        let mut engine = engine();
        rename(&mut engine, 2, "/store");

        let redirects = &engine.redirects().redirects;
        assert!(redirects.contains(&Redirect {
            node: id(3),
            language: LanguageId::DEFAULT,
            from: slug("/shop/shoes"),
            to: slug("/store/shoes"),
        }));
        assert!(redirects.iter().any(|r| r.node == id(2)));
    }

    #[test]
    fn cyclic_parents_terminate() {
        let store = MemoryStore::from_nodes([
            Node::new(id(1), Some(id(2)), slug("/a")).with_sync(true),
            Node::new(id(2), Some(id(1)), slug("/a/b")).with_sync(true),
        ]);
        let mut engine = SlugEngine::new(store, NoRedirects, Config::default());
        let trigger = engine.store().require(id(1)).unwrap();

        let report = CascadeUpdateCoordinator::run(
            &mut engine,
            &trigger,
            HashMap::from([(id(1), slug("/x"))]),
            &CorrelationId::new(),
        );
        assert!(report.updated.is_empty());
        assert_eq!(report.skip_reason(id(2)), Some(SkipReason::MissingSite));
    }

    #[test]
    fn translations_fan_out() {
        let lang = LanguageId::new(1);
        let mut engine = engine();
        engine
            .store_mut()
            .save(
                Node::new(id(20), Some(id(1)), slug("/laden"))
                    .translating(id(2), lang)
                    .with_field("title", "Laden"),
            )
            .unwrap();
        engine
            .store_mut()
            .save(
                Node::new(id(30), Some(id(2)), slug("/laden/shoes"))
                    .translating(id(3), lang)
                    .with_field("title", "Schuhe"),
            )
            .unwrap();

        rename(&mut engine, 20, "/geschaeft");
        assert_eq!(slug_of(&engine, 30), "/geschaeft/schuhe");
        assert_eq!(slug_of(&engine, 3), "/shop/shoes");
    }
}
