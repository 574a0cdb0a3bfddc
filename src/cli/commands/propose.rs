//! propose command - Answer one proposal request
//!
//! Reads a form-encoded request body from stdin and prints the JSON
//! response, the same exchange the editing widget has with the server.
//! Nothing is written to the tree.

use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::Context;
use crate::protocol::{AcceptAll, FixedSignature, ProposalHandler, ProposalResponse};
use crate::store::FileStore;

/// Handle the request on stdin against `tree`.
pub fn propose(ctx: &Context, tree: &Path, signature: Option<&str>) -> Result<()> {
    let mut body = Vec::new();
    std::io::stdin()
        .read_to_end(&mut body)
        .context("Failed to read request from stdin")?;

    let config = ctx.load_config()?;
    let store = FileStore::open(tree)
        .with_context(|| format!("Failed to open tree '{}'", tree.display()))?;

    let response: ProposalResponse = match signature {
        Some(expected) => ProposalHandler::new(&store, &config, FixedSignature(expected.into()))
            .handle_form(trim_body(&body)),
        None => ProposalHandler::new(&store, &config, AcceptAll).handle_form(trim_body(&body)),
    }
    .context("Proposal request failed")?;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

/// Drop the trailing newline shells add to piped input.
fn trim_body(body: &[u8]) -> &[u8] {
    let end = body
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &body[..end]
}
