//! create command - Create a node or a translation

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use super::{auth_from, finish, open_engine, print_outcome, Context};
use crate::cli::args::ActorArgs;
use crate::core::types::{LanguageId, NodeId};
use crate::engine::{CorrelationId, NewNode};

/// Placement and contents of the new node.
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    pub parent: Option<NodeId>,
    pub translate: Option<NodeId>,
    pub language: Option<u32>,
    pub slug: Option<String>,
    pub fields: Vec<(String, String)>,
    pub sorting: u32,
}

/// Create a node. Without `--slug` the slug is generated from the fields.
pub fn create(ctx: &Context, tree: &Path, args: CreateArgs, actor: &ActorArgs) -> Result<()> {
    let mut new = match (args.parent, args.translate, args.language) {
        (Some(parent), None, _) => NewNode::child_of(parent),
        (None, Some(original), Some(language)) if language > 0 => {
            NewNode::translation(original, LanguageId::new(language))
        }
        (None, Some(_), _) => bail!("A translation needs --language greater than 0"),
        _ => bail!("Either --parent or --translate is required"),
    };
    new.slug = args.slug;
    new.fields = args.fields.into_iter().collect();
    new.sorting = args.sorting;

    let mut engine = open_engine(ctx, tree)?;
    let auth = auth_from(actor);
    let outcome = engine
        .create(new, &auth, &CorrelationId::new())
        .context("Failed to create node")?;
    let redirects = finish(engine)?;

    print_outcome(ctx, "created", &outcome, &redirects);
    Ok(())
}
