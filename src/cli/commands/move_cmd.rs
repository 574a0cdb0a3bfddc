//! move and copy commands - Place a node below another parent

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{finish, open_engine, print_outcome, Context};
use crate::core::types::NodeId;
use crate::engine::CorrelationId;

/// Move a node; its slug and its synchronized subtree follow the new parent.
pub fn move_node(ctx: &Context, tree: &Path, node: NodeId, parent: NodeId) -> Result<()> {
    let mut engine = open_engine(ctx, tree)?;
    let outcome = engine
        .move_node(node, parent, &CorrelationId::new())
        .with_context(|| format!("Failed to move node {} below {}", node, parent))?;
    let redirects = finish(engine)?;

    print_outcome(ctx, "moved", &outcome, &redirects);
    Ok(())
}

/// Copy a node with its translations.
pub fn copy(ctx: &Context, tree: &Path, node: NodeId, parent: NodeId) -> Result<()> {
    let mut engine = open_engine(ctx, tree)?;
    let outcome = engine
        .copy_node(node, parent, &CorrelationId::new())
        .with_context(|| format!("Failed to copy node {} below {}", node, parent))?;
    let redirects = finish(engine)?;

    print_outcome(ctx, "copied to", &outcome, &redirects);
    Ok(())
}
