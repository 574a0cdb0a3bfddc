//! check command - Verify slug invariants of a tree

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use super::Context;
use crate::core::node::Node;
use crate::core::verify::verify_tree;
use crate::store::{FileStore, NodeStore};

/// Verify the tree and fail when any invariant is violated.
pub fn check(ctx: &Context, tree: &Path) -> Result<()> {
    let store = FileStore::open(tree)
        .with_context(|| format!("Failed to open tree '{}'", tree.display()))?;
    let nodes = store.find(&|_: &Node| true).context("Failed to read nodes")?;

    let result = verify_tree(&nodes);
    if result.ok {
        if !ctx.quiet {
            println!("ok: {} records, no issues", nodes.len());
        }
        return Ok(());
    }

    for error in &result.errors {
        println!("issue: {}", error);
    }
    bail!("{} issue(s) found in '{}'", result.errors.len(), tree.display())
}
