//! Trellis - a convention-based page router.
//!
//! A source tree of `data.rs` / `render.rs` / `handler.rs` modules and
//! `index.html` / `page.html` / `metadata.html` templates is turned into a
//! route registry without compiling it: `build` reads the modules
//! statically and writes `generated.rs`, which the site program compiles in
//! and passes to [`run`] to render and serve.
//!
//! ```ignore
//! mod generated;
//! mod site;
//!
//! fn main() -> anyhow::Result<()> {
//!     trellis::run(generated::registry())
//! }
//! ```
//!
//! ```text
//! site/
//! ├── index.html          layout, inherited by every directory below
//! ├── about/
//! │   ├── data.rs         pub static DATA: PageData      → /about
//! │   └── page.html
//! ├── cards/
//! │   └── render.rs       pub fn card() -> RenderOutput  → /cards/card
//! └── api/
//!     └── handler.rs      pub fn handler(..)             → /api
//! ```

pub mod build;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod render;
pub mod routes;
pub mod serve;
pub mod utils;

pub use minijinja::{Value, context};
pub use render::TemplateRenderer;
pub use routes::{PageData, Registry, RenderOutput};
pub use serve::{RequestContext, html_response};
pub use tiny_http;

use anyhow::Result;
use build::{build_site, render_site};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use serve::Dispatcher;

/// Entry point of a site program compiled together with `generated.rs`.
///
/// Parses the command line and runs `build`, `render` or `serve` against
/// `registry`.
pub fn run(registry: Registry) -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => build_site(&config).map(|_| ()),
        Commands::Render => render_site(&registry, &config),
        Commands::Serve { .. } => {
            render_site(&registry, &config)?;
            Dispatcher::new(registry, &config).serve(&config)
        }
    }
}
