//! init command - Create a new tree file

use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::node::Node;
use crate::core::types::NodeId;
use crate::store::FileStore;

/// Create a tree file holding one site root with id 1.
pub fn init(ctx: &Context, tree: &Path) -> Result<()> {
    FileStore::create(tree, vec![Node::site_root(NodeId::new(1))])
        .with_context(|| format!("Failed to create tree '{}'", tree.display()))?;

    if !ctx.quiet {
        println!("Created {} with site root 1", tree.display());
    }
    Ok(())
}
