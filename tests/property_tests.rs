//! Property-based tests for slug handling.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use slugsync::core::config::Config;
use slugsync::core::naming::{is_path_prefix, join_path, parent_path, sanitize_path};
use slugsync::core::node::Node;
use slugsync::core::types::{NodeId, SlugPath};
use slugsync::engine::{
    CorrelationId, NoRedirects, NodeUpdate, PermissionScopeResolver, SlugEngine, SystemAuth,
    UniquenessResolver,
};
use slugsync::store::{MemoryStore, NodeStore};
use slugsync::widget::render::split_slug;

/// Free text as an editor would type it, including umlauts and separators.
fn typed_text() -> impl Strategy<Value = String> {
    "[ -~äöüÄÖÜß]{0,40}"
}

/// One canonical slug segment.
fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9-]{0,8}"
}

/// A canonical, non-root slug.
fn slug() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|segments| format!("/{}", segments.join("/")))
}

/// Pages below section 2: (index of the parent among earlier pages, locked).
fn page_layout() -> impl Strategy<Value = Vec<(prop::sample::Index, bool)>> {
    prop::collection::vec((any::<prop::sample::Index>(), prop::bool::weighted(0.25)), 0..12)
}

/// root(1) -> section(2) -> pages 3.. in a random shape, all synchronized.
fn build_tree(layout: &[(prop::sample::Index, bool)]) -> Vec<Node> {
    let mut nodes = vec![
        Node::site_root(NodeId::new(1)),
        Node::new(NodeId::new(2), Some(NodeId::new(1)), SlugPath::new("/section").unwrap())
            .with_field("title", "Section")
            .with_sync(true),
    ];
    for (i, (parent, locked)) in layout.iter().enumerate() {
        let id = i as u64 + 3;
        // Any earlier page, or the section itself.
        let parent = &nodes[1 + parent.index(nodes.len() - 1)];
        let slug = SlugPath::new(join_path(parent.slug.as_str(), &format!("page-{id}"))).unwrap();
        let node = Node::new(NodeId::new(id), Some(parent.id), slug)
            .with_field("title", format!("Page {id}"))
            .with_sync(true)
            .with_lock(*locked);
        nodes.push(node);
    }
    nodes
}

proptest! {
    #[test]
    fn cascade_rebuilds_synced_and_keeps_locked(layout in page_layout(), new_root in segment()) {
        let before = build_tree(&layout);
        let mut engine = SlugEngine::new(
            MemoryStore::from_nodes(before.clone()),
            NoRedirects,
            Config::default(),
        );

        let renamed = format!("/{new_root}");
        engine
            .process(
                NodeUpdate::new(NodeId::new(2)).with_slug(renamed),
                &SystemAuth,
                &CorrelationId::new(),
            )
            .unwrap();

        let store = engine.store();
        for original in &before[2..] {
            let node = store.require(original.id).unwrap();
            if original.locked {
                prop_assert_eq!(&node.slug, &original.slug);
                continue;
            }
            // Unlocked pages sit below their parent's current slug, locked or not.
            let parent = store.require(original.parent_id.unwrap()).unwrap();
            let expected = join_path(parent.slug.as_str(), &format!("page-{}", node.id));
            prop_assert_eq!(node.slug.as_str(), expected.as_str());
        }
    }

    #[test]
    fn sanitize_is_idempotent(raw in typed_text()) {
        let once = sanitize_path(&raw, '-');
        let twice = sanitize_path(&once, '-');
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sanitized_paths_are_valid_slugs(raw in typed_text()) {
        let sanitized = sanitize_path(&raw, '-');
        prop_assert!(SlugPath::new(sanitized.clone()).is_ok(), "invalid slug {:?}", sanitized);
        prop_assert!(!sanitized.contains("//"));
    }

    #[test]
    fn empty_prefix_allows_everything(old in slug(), new in slug()) {
        prop_assert!(PermissionScopeResolver::validate_slug_change("", &old, &new));
    }

    #[test]
    fn slugs_below_prefix_are_allowed(prefix in slug(), rest in slug()) {
        let inside = join_path(&prefix, &rest);
        prop_assert!(PermissionScopeResolver::validate_slug_change(&prefix, &prefix, &inside));
        prop_assert!(PermissionScopeResolver::validate_slug_change(&prefix, &inside, &prefix));
    }

    #[test]
    fn extending_last_prefix_segment_is_rejected(prefix in slug(), extra in segment()) {
        // "/shop" must not admit "/shopping".
        let sibling = format!("{prefix}{extra}");
        prop_assert!(!PermissionScopeResolver::validate_slug_change(&prefix, &prefix, &sibling));
    }

    #[test]
    fn split_reassembles_value(
        value in slug(),
        depth in 0usize..4,
        last_segment_only in any::<bool>(),
        full_path_mode in any::<bool>(),
    ) {
        let mut locked_prefix = value.as_str();
        for _ in 0..depth {
            locked_prefix = parent_path(locked_prefix);
        }

        let split = split_slug(&value, locked_prefix, last_segment_only, full_path_mode);
        prop_assert_eq!(format!("{}{}", split.readonly, split.editable), value.clone());
        prop_assert!(is_path_prefix(&split.readonly, &value));
    }

    #[test]
    fn unique_result_avoids_taken(candidate in slug(), taken in prop::collection::vec(0u32..6, 0..6)) {
        let mut taken: Vec<String> = taken
            .into_iter()
            .map(|n| if n == 0 { candidate.clone() } else { format!("{candidate}-{n}") })
            .collect();
        taken.sort();
        taken.dedup();

        let resolver = UniquenessResolver::new(100);
        let candidate_slug = SlugPath::new(candidate.clone()).unwrap();
        let unique = resolver.ensure_unique(&candidate_slug, taken.iter().map(String::as_str));

        prop_assert!(!taken.contains(&unique.to_string()));
        if !taken.contains(&candidate) {
            prop_assert_eq!(unique.as_str(), candidate.as_str());
        }

        // Resolving again against the same siblings is stable.
        let again = resolver.ensure_unique(&candidate_slug, taken.iter().map(String::as_str));
        prop_assert_eq!(unique, again);
    }
}
