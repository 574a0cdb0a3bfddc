//! show command - Print the tree with slugs and flags
//!
//! ```text
//! /                       [1] site
//!   /shop                 [2]
//!     /shop/shoes         [3] sync
//!     /shop/bags          [4] lock
//! ```
//!
//! Records are shown in the requested language; nodes without a
//! translation fall back to the default language and are marked.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::node::Node;
use crate::core::types::{LanguageId, NodeId};
use crate::store::{FileStore, NodeStore, StoreError};

/// Print the tree in `language`.
pub fn show(_ctx: &Context, tree: &Path, language: u32) -> Result<()> {
    let store = FileStore::open(tree)
        .with_context(|| format!("Failed to open tree '{}'", tree.display()))?;
    let language = LanguageId::new(language);

    let lines = render_tree(&store, language).context("Failed to read tree")?;
    if lines.is_empty() {
        println!("(empty tree)");
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// One output line per live node, depth first in sibling order.
fn render_tree<S: NodeStore + ?Sized>(
    store: &S,
    language: LanguageId,
) -> Result<Vec<String>, StoreError> {
    let mut roots = store.find(&|n: &Node| {
        n.parent_id.is_none() && !n.is_translation() && !n.deleted
    })?;
    roots.sort_by_key(|n| (n.sorting, n.id));

    let mut lines = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<(NodeId, usize)> = roots.iter().rev().map(|n| (n.id, 0)).collect();

    while let Some((id, depth)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let original = store.require(id)?;
        let record = match store.variant(id, language)? {
            Some(variant) if !variant.deleted => variant,
            _ => original.clone(),
        };
        lines.push(format_line(&record, &original, language, depth));

        let children = store.children(id, LanguageId::DEFAULT)?;
        stack.extend(children.iter().rev().map(|c| (c.id, depth + 1)));
    }

    Ok(lines)
}

fn format_line(record: &Node, original: &Node, language: LanguageId, depth: usize) -> String {
    let mut flags = Vec::new();
    if original.is_site_root {
        flags.push("site");
    }
    // Flags live on the default-language record.
    if original.sync_enabled {
        flags.push("sync");
    }
    if original.locked {
        flags.push("lock");
    }
    if record.language != language {
        flags.push("untranslated");
    }

    let slug = format!("{}{}", "  ".repeat(depth), record.slug);
    let id = format!("[{}]", record.id);
    if flags.is_empty() {
        format!("{:<32} {}", slug, id).trim_end().to_string()
    } else {
        format!("{:<32} {} {}", slug, id, flags.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SlugPath;
    use crate::store::MemoryStore;

    fn slug(s: &str) -> SlugPath {
        SlugPath::new(s).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::from_nodes([
            Node::site_root(NodeId::new(1)),
            Node::new(NodeId::new(2), Some(NodeId::new(1)), slug("/shop")).with_sorting(1),
            Node::new(NodeId::new(3), Some(NodeId::new(2)), slug("/shop/shoes")).with_sync(true),
            Node::new(NodeId::new(4), Some(NodeId::new(1)), slug("/about")).with_sorting(2),
            Node::new(NodeId::new(12), Some(NodeId::new(1)), slug("/laden"))
                .translating(NodeId::new(2), LanguageId::new(1)),
        ])
    }

    #[test]
    fn renders_depth_first_in_sibling_order() {
        let lines = render_tree(&store(), LanguageId::DEFAULT).unwrap();
        let slugs: Vec<&str> = lines
            .iter()
            .map(|l| l.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(slugs, vec!["/", "/shop", "/shop/shoes", "/about"]);
        assert!(lines[0].ends_with("[1] site"));
        assert!(lines[2].ends_with("[3] sync"));
    }

    #[test]
    fn marks_untranslated_fallbacks() {
        let lines = render_tree(&store(), LanguageId::new(1)).unwrap();
        assert!(lines[1].contains("/laden"));
        assert!(lines[1].contains("[12]"));
        assert!(!lines[1].contains("untranslated"));
        assert!(lines[3].contains("/about"));
        assert!(lines[3].contains("untranslated"));
    }
}
