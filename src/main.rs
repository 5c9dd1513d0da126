//! Standalone `trellis` binary: runs the build stage only.
//!
//! Rendering and serving need the generated registry compiled in, so they
//! are run from the site program through `trellis::run`.

use anyhow::{Result, bail};
use clap::Parser;
use trellis::{build::build_site, cli::Cli, config::SiteConfig, log};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    if !cli.is_build() {
        bail!(
            "`{}` needs a compiled route registry: run it from your site program via `trellis::run(generated::registry())`",
            cli.command_name()
        );
    }

    let registry = build_site(&config)?;
    if registry.is_empty() {
        log!("warn"; "no routes registered under {}", config.build.source.display());
    }
    Ok(())
}
