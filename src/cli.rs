//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trellis convention-based page router CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file name (default: trellis.toml)
    #[arg(short = 'C', long, default_value = "trellis.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scan the source tree, render generic pages and write the route registry
    Build {
        /// Source tree to scan (relative to project root)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Rust path the source tree is mounted at, e.g. `crate::site`
        #[arg(short, long)]
        prefix: Option<String>,

        /// Where to write the generated registry module
        #[arg(short, long)]
        generated: Option<PathBuf>,
    },

    /// Render every registered page into the output directory
    Render,

    /// Render, then serve registered routes and static files
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// URL prefix static files are mounted at
        #[arg(long = "static-prefix")]
        static_prefix: Option<String>,
    },
}

impl Cli {
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build { .. })
    }
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }

    /// Subcommand name as typed on the command line.
    pub const fn command_name(&self) -> &'static str {
        match self.command {
            Commands::Build { .. } => "build",
            Commands::Render => "render",
            Commands::Serve { .. } => "serve",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_overrides() {
        let cli = Cli::parse_from([
            "trellis", "-r", "site-root", "build", "--source", "pages", "--prefix", "crate::pages",
        ]);
        assert!(cli.is_build());
        assert_eq!(cli.root, Some(PathBuf::from("site-root")));
        assert_eq!(cli.config, PathBuf::from("trellis.toml"));
        match cli.command {
            Commands::Build {
                source,
                prefix,
                generated,
            } => {
                assert_eq!(source, Some(PathBuf::from("pages")));
                assert_eq!(prefix.as_deref(), Some("crate::pages"));
                assert!(generated.is_none());
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["trellis", "serve", "-p", "9000", "--static-prefix", "/assets/"]);
        assert!(cli.is_serve());
        assert_eq!(cli.command_name(), "serve");
        match cli.command {
            Commands::Serve {
                interface,
                port,
                static_prefix,
            } => {
                assert!(interface.is_none());
                assert_eq!(port, Some(9000));
                assert_eq!(static_prefix.as_deref(), Some("/assets/"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_requires_subcommand() {
        assert!(Cli::try_parse_from(["trellis"]).is_err());
    }
}
