//! Stage-one pipeline: turn a convention tree into a route registry.
//!
//! - **scan**: Walk the source tree and classify convention files per directory
//! - **extract**: Statically read a route module's exported surface
//! - **registry**: Apply naming and precedence rules into four collections
//! - **codegen**: Emit the registry as Rust source for the next compilation
//!
//! # Build Flow
//!
//! ```text
//! scan_tree() ──► SourceModule::parse() ──► RegistryBuilder::build() ──► write_generated()
//!      │                  │                          │                          │
//!      ▼                  ▼                          ▼                          ▼
//! RouteDirectory[]   exported names             RouteRegistry             generated.rs
//! ```

pub mod codegen;
pub mod extract;
pub mod registry;
pub mod scan;

pub use codegen::{synthesize, write_generated};
pub use extract::SourceModule;
pub use registry::{RegistryBuilder, RouteRegistry};
pub use scan::{FileRole, RouteDirectory, scan_tree};

// ============================================================================
// Conventions
// ============================================================================

pub const DATA_FILE: &str = "data.rs";
pub const RENDER_FILE: &str = "render.rs";
pub const HANDLER_FILE: &str = "handler.rs";
pub const PAGE_FILE: &str = "page.html";
pub const INDEX_FILE: &str = "index.html";
pub const METADATA_FILE: &str = "metadata.html";
/// Output-only name of the fragment artifact; never read from the source tree.
pub const PAGE_BODY_FILE: &str = "page-body.html";

/// Name of the static a data module must declare to become a data route.
pub const DATA_VARIABLE: &str = "DATA";
/// Render function served at the directory's own route path.
pub const ROOT_RENDER: &str = "render";
/// Handler function served at the directory's own route path.
pub const ROOT_HANDLER: &str = "handler";
/// Function-name suffix opting a render function out of path derivation.
pub const CUSTOM_SUFFIX: char = '_';

/// Leading marker: the directory and its whole subtree are skipped.
pub const IGNORED_PREFIX: char = '_';
/// Trailing marker: the directory still counts but is dropped from route paths.
pub const GROUP_SUFFIX: char = '_';

/// Join a route path and an optional trailing segment into a URL path.
///
/// ```text
/// ("about", None)         → "/about"
/// ("about", Some("feed")) → "/about/feed"
/// ("", Some("feed"))      → "/feed"
/// ("", None)              → "/"
/// ```
pub fn url_path(route: &str, segment: Option<&str>) -> String {
    let mut url = String::from("/");
    url.push_str(route);
    if let Some(segment) = segment {
        if !route.is_empty() {
            url.push('/');
        }
        url.push_str(segment);
    }
    url
}
