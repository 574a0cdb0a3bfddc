//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the configuration and opens (and locks) the tree file
//! 2. Calls the engine to execute the command
//! 3. Flushes the tree and formats the output
//!
//! Handlers do NOT modify nodes directly; every change goes through
//! [`SlugEngine`].

mod check;
mod config_cmd;
mod create;
mod delete;
mod edit;
mod init;
mod move_cmd;
mod propose;
mod show;

pub use check::check;
pub use config_cmd::config;
pub use create::create;
pub use delete::{delete, restore};
pub use edit::edit;
pub use init::init;
pub use move_cmd::{copy, move_node};
pub use propose::propose;
pub use show::show;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::args::{ActorArgs, Command};
use crate::core::config::Config;
use crate::engine::{
    CascadeReport, RecordingRedirects, SlugEngine, StaticAuth, UpdateOutcome,
};
use crate::store::FileStore;

/// Execution context shared by all commands.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit configuration file from `--config`
    pub config_path: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    /// Load the configuration from `--config` or the standard locations.
    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config_path.as_deref()).context("Failed to load configuration")
    }
}

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { tree } => init::init(ctx, &tree.tree),
        Command::Show { tree, language } => show::show(ctx, &tree.tree, language),
        Command::Edit {
            tree,
            node,
            slug,
            fields,
            sync,
            lock,
            full_path,
            actor,
        } => edit::edit(
            ctx,
            &tree.tree,
            edit::EditArgs {
                node,
                slug,
                fields,
                sync: sync.map(Into::into),
                lock: lock.map(Into::into),
                full_path,
            },
            &actor,
        ),
        Command::Create {
            tree,
            parent,
            translate,
            language,
            slug,
            fields,
            sorting,
            actor,
        } => create::create(
            ctx,
            &tree.tree,
            create::CreateArgs {
                parent,
                translate,
                language,
                slug,
                fields,
                sorting,
            },
            &actor,
        ),
        Command::Move { tree, node, parent } => move_cmd::move_node(ctx, &tree.tree, node, parent),
        Command::Copy { tree, node, parent } => move_cmd::copy(ctx, &tree.tree, node, parent),
        Command::Delete { tree, node } => delete::delete(ctx, &tree.tree, node),
        Command::Restore { tree, node } => delete::restore(ctx, &tree.tree, node),
        Command::Propose { tree, signature } => {
            propose::propose(ctx, &tree.tree, signature.as_deref())
        }
        Command::Check { tree } => check::check(ctx, &tree.tree),
        Command::Config => config_cmd::config(ctx),
    }
}

/// The engine every mutating command works with.
type FileEngine = SlugEngine<FileStore, RecordingRedirects>;

/// Load config, then lock and open the tree.
fn open_engine(ctx: &Context, tree: &Path) -> Result<FileEngine> {
    let config = ctx.load_config()?;
    let store = FileStore::open(tree)
        .with_context(|| format!("Failed to open tree '{}'", tree.display()))?;
    Ok(SlugEngine::new(store, RecordingRedirects::default(), config))
}

/// Write the tree back and release the lock.
fn finish(engine: FileEngine) -> Result<RecordingRedirects> {
    let (mut store, redirects) = engine.into_parts();
    store
        .flush()
        .with_context(|| format!("Failed to write tree '{}'", store.path().display()))?;
    Ok(redirects)
}

fn auth_from(actor: &ActorArgs) -> StaticAuth {
    if actor.admin {
        return StaticAuth::admin(actor.user.clone());
    }
    let auth = StaticAuth::editor(actor.user.clone(), actor.user_editable.iter().copied());
    if actor.can_unlock {
        auth.with_unlock()
    } else {
        auth
    }
}

/// Print a mutation outcome: the node, warnings, the cascade and redirects.
fn print_outcome(
    ctx: &Context,
    verb: &str,
    outcome: &UpdateOutcome,
    redirects: &RecordingRedirects,
) {
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }
    if ctx.quiet {
        return;
    }

    let node = &outcome.node;
    if outcome.slug_changed() {
        println!(
            "{} node {}: {} -> {}",
            verb, node.id, outcome.previous_slug, node.slug
        );
    } else {
        println!("{} node {}: {}", verb, node.id, node.slug);
    }
    print_cascade(&outcome.cascade);

    if !redirects.redirects.is_empty() {
        println!("redirects:");
        for r in &redirects.redirects {
            println!("  {} -> {}  (node {}, language {})", r.from, r.to, r.node, r.language);
        }
    }
}

fn print_cascade(report: &CascadeReport) {
    if report.is_empty() {
        return;
    }
    println!(
        "cascade: {} updated, {} skipped, {} failed",
        report.updated.len(),
        report.skipped.len(),
        report.errors.len()
    );
    for change in &report.updated {
        println!("  ~ {} {} -> {}", change.node, change.old, change.new);
    }
    for skipped in &report.skipped {
        println!("  = {} ({})", skipped.node, skipped.reason);
    }
    for failure in &report.errors {
        println!("  ! {} {}", failure.node, failure.message);
    }
}

