//! delete and restore commands - Soft-delete and bring back subtrees

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{finish, open_engine, print_outcome, Context};
use crate::core::types::NodeId;
use crate::engine::CorrelationId;

/// Soft-delete a node, its translations and its subtree.
pub fn delete(ctx: &Context, tree: &Path, node: NodeId) -> Result<()> {
    let mut engine = open_engine(ctx, tree)?;
    let deleted = engine
        .delete(node)
        .with_context(|| format!("Failed to delete node {}", node))?;
    finish(engine)?;

    if !ctx.quiet {
        let ids: Vec<String> = deleted.iter().map(|id| id.to_string()).collect();
        println!("deleted {} record(s): {}", deleted.len(), ids.join(", "));
    }
    Ok(())
}

/// Restore a deleted node. A slug taken in the meantime gets a suffix.
pub fn restore(ctx: &Context, tree: &Path, node: NodeId) -> Result<()> {
    let mut engine = open_engine(ctx, tree)?;
    let outcome = engine
        .restore(node, &CorrelationId::new())
        .with_context(|| format!("Failed to restore node {}", node))?;
    let redirects = finish(engine)?;

    print_outcome(ctx, "restored", &outcome, &redirects);
    Ok(())
}
