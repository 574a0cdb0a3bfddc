//! config command - Print the effective configuration

use anyhow::{Context as _, Result};

use super::Context;

/// Print the configuration with every default filled in.
pub fn config(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;

    if !ctx.quiet {
        match config.loaded_from() {
            Some(path) => println!("# loaded from {}", path.display()),
            None => println!("# no config file found, showing defaults"),
        }
    }
    let rendered = config
        .to_effective_toml()
        .context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
