//! cli
//!
//! Command-line interface layer for slugsync.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! the [`crate::engine`] for execution. All tree changes flow through the
//! engine's mutation pipeline.

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::Context;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "SLUGSYNC_LOG";

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug, cli.quiet);

    let ctx = Context {
        config_path: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install the fmt subscriber on stderr.
///
/// `SLUGSYNC_LOG` takes precedence; otherwise `--debug` raises the level to
/// debug and `--quiet` lowers it to errors only.
fn init_tracing(debug: bool, quiet: bool) {
    let fallback = if debug {
        "slugsync=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
