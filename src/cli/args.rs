//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this configuration file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::types::NodeId;

/// slugsync - Cascading slug synchronization for content trees
#[derive(Parser, Debug)]
#[command(name = "slugsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $SLUGSYNC_CONFIG or the user config)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// The tree file every tree command operates on.
#[derive(Args, Debug, Clone)]
pub struct TreeArg {
    /// Tree file (JSON, kind "slugsync.tree")
    #[arg(long, value_name = "FILE")]
    pub tree: PathBuf,
}

/// Who performs a mutation.
#[derive(Args, Debug, Clone, Default)]
pub struct ActorArgs {
    /// Act as an administrator (no prefix restrictions)
    #[arg(long)]
    pub admin: bool,

    /// Records the acting editor may edit (comma separated)
    #[arg(long, value_name = "ID,...", value_delimiter = ',')]
    pub user_editable: Vec<NodeId>,

    /// Allow clearing locks
    #[arg(long)]
    pub can_unlock: bool,

    /// Name recorded in audit entries
    #[arg(long, default_value = "cli", value_name = "NAME")]
    pub user: String,
}

/// An on/off switch argument.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> bool {
        switch == Switch::On
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new tree file holding a single site root
    #[command(name = "init")]
    Init {
        #[command(flatten)]
        tree: TreeArg,
    },

    /// Print the tree with slugs and flags
    #[command(
        name = "show",
        after_help = "\
EXAMPLES:
    # Whole tree, default language
    slugsync show --tree site.json

    # German records (language 1)
    slugsync show --tree site.json --language 1"
    )]
    Show {
        #[command(flatten)]
        tree: TreeArg,

        /// Language to show
        #[arg(long, default_value_t = 0)]
        language: u32,
    },

    /// Apply one update to a node
    #[command(
        name = "edit",
        long_about = "Apply one update to a node.\n\n\
            The update runs through the same pipeline as any other write: lock and \
            sync flags are screened, explicit slugs are sanitized and checked against \
            the editor's locked prefix, sibling collisions are resolved, and slug \
            changes cascade to synchronized descendants.",
        after_help = "\
EXAMPLES:
    # Rename a section; synchronized children follow
    slugsync edit --tree site.json --node 2 --slug /store --admin

    # An editor limited to node 7 changes a title
    slugsync edit --tree site.json --node 7 --field title='New Title' --user-editable 7

    # Freeze a slug
    slugsync edit --tree site.json --node 7 --lock on --admin"
    )]
    Edit {
        #[command(flatten)]
        tree: TreeArg,

        /// Node to edit
        #[arg(long)]
        node: NodeId,

        /// New slug
        #[arg(long)]
        slug: Option<String>,

        /// Source field value (repeatable)
        #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Turn slug synchronization on or off
        #[arg(long, value_enum)]
        sync: Option<Switch>,

        /// Lock or unlock the slug
        #[arg(long, value_enum)]
        lock: Option<Switch>,

        /// Allow a full path for this update when only the last segment is editable
        #[arg(long)]
        full_path: bool,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Create a node
    #[command(name = "create")]
    Create {
        #[command(flatten)]
        tree: TreeArg,

        /// Parent of the new node
        #[arg(long, conflicts_with = "translate")]
        parent: Option<NodeId>,

        /// Create a translation of this default-language node
        #[arg(long, requires = "language")]
        translate: Option<NodeId>,

        /// Language of the translation
        #[arg(long)]
        language: Option<u32>,

        /// Explicit slug (generated from fields otherwise)
        #[arg(long)]
        slug: Option<String>,

        /// Source field value (repeatable)
        #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Ordering among siblings
        #[arg(long, default_value_t = 0)]
        sorting: u32,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Move a node below another parent
    #[command(name = "move")]
    Move {
        #[command(flatten)]
        tree: TreeArg,

        /// Node to move
        #[arg(long)]
        node: NodeId,

        /// New parent
        #[arg(long)]
        parent: NodeId,
    },

    /// Copy a node (and its translations) below another parent
    #[command(name = "copy")]
    Copy {
        #[command(flatten)]
        tree: TreeArg,

        /// Node to copy
        #[arg(long)]
        node: NodeId,

        /// Parent of the copy
        #[arg(long)]
        parent: NodeId,
    },

    /// Soft-delete a node and its subtree
    #[command(name = "delete")]
    Delete {
        #[command(flatten)]
        tree: TreeArg,

        /// Node to delete
        #[arg(long)]
        node: NodeId,
    },

    /// Restore a deleted node
    #[command(name = "restore")]
    Restore {
        #[command(flatten)]
        tree: TreeArg,

        /// Node to restore
        #[arg(long)]
        node: NodeId,
    },

    /// Answer a form-encoded proposal request read from stdin
    #[command(
        name = "propose",
        after_help = "\
EXAMPLES:
    echo 'mode=manual&recordId=3&values[manual]=/demo' | slugsync propose --tree site.json"
    )]
    Propose {
        #[command(flatten)]
        tree: TreeArg,

        /// Require this request signature
        #[arg(long)]
        signature: Option<String>,
    },

    /// Verify slug invariants; exits non-zero on violations
    #[command(name = "check")]
    Check {
        #[command(flatten)]
        tree: TreeArg,
    },

    /// Print the effective configuration as TOML
    #[command(name = "config")]
    Config,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}
