//! edit command - Apply one update to a node

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{auth_from, finish, open_engine, print_outcome, Context};
use crate::cli::args::ActorArgs;
use crate::core::types::NodeId;
use crate::engine::{CorrelationId, NodeUpdate};

/// What to change on the node.
#[derive(Debug, Clone)]
pub struct EditArgs {
    pub node: NodeId,
    pub slug: Option<String>,
    pub fields: Vec<(String, String)>,
    pub sync: Option<bool>,
    pub lock: Option<bool>,
    pub full_path: bool,
}

/// Apply one update through the mutation pipeline and save the tree.
///
/// Rejected slug changes are reported as warnings; the rest of the update
/// is still applied.
pub fn edit(ctx: &Context, tree: &Path, args: EditArgs, actor: &ActorArgs) -> Result<()> {
    let mut engine = open_engine(ctx, tree)?;
    let auth = auth_from(actor);
    let correlation = CorrelationId::new();

    let id = args.node;
    let mut update = NodeUpdate::new(id);
    update.slug = args.slug;
    update.fields = args.fields.into_iter().collect();
    update.sync_enabled = args.sync;
    update.locked = args.lock;
    update.full_path_override = args.full_path;

    let outcome = engine
        .process(update, &auth, &correlation)
        .with_context(|| format!("Failed to update node {}", id))?;
    let redirects = finish(engine)?;

    print_outcome(ctx, "updated", &outcome, &redirects);
    Ok(())
}
