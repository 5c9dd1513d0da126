//! Build pipeline errors.
//!
//! Every variant is fatal: the build stops at the first error and no
//! partially generated registry or artifact set is considered valid.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// A route directory has no `index.html` between itself and the source root.
    #[error("missing index.html for `{}` (searched up to the source root)", dir.display())]
    MissingIndex { dir: PathBuf },

    /// A page directory has templates but none of them is `page.html`.
    #[error("missing page.html for `{}`: provide a data.rs and/or page.html", dir.display())]
    MissingPageTemplate { dir: PathBuf },

    #[error("failed to parse `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    #[error("failed to write generated registry `{}`", path.display())]
    SynthesisWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write rendered artifact `{}`", path.display())]
    RenderWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template execution failed for `{target}`")]
    TemplateExecution {
        target: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("IO error when reading `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk source tree")]
    Walk(#[from] walkdir::Error),
}
