//! Static symbol extraction for route modules.
//!
//! A route module (`data.rs`, `render.rs`, `handler.rs`) is parsed with `syn`
//! and only its top-level declarations are inspected. Nothing is compiled,
//! expanded or evaluated, so a module that would fail to type-check still
//! yields its exported names.

use super::DATA_VARIABLE;
use crate::error::BuildError;
use std::{
    fs,
    path::{Component, Path},
};
use syn::{Item, Visibility};

/// Declaration-level view of one parsed route module.
pub struct SourceModule {
    namespace: Option<String>,
    file: syn::File,
}

impl SourceModule {
    /// Read and parse the module at `path`, located under the source `root`.
    pub fn parse(path: &Path, root: &Path) -> Result<Self, BuildError> {
        let source = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let relative = path.strip_prefix(root).unwrap_or(path);
        Self::from_source(&source, path, namespace_of(relative))
    }

    /// Parse already-loaded source text.
    pub fn from_source(
        source: &str,
        path: &Path,
        namespace: Option<String>,
    ) -> Result<Self, BuildError> {
        let file = syn::parse_file(source).map_err(|source| BuildError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            namespace,
            file,
        })
    }

    /// Module path of the directory that owns this file, e.g. `blog::posts`.
    ///
    /// `None` when some directory name is not a Rust identifier, in which
    /// case the module cannot be referenced from generated code.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Exported top-level functions in declaration order.
    pub fn exported_functions(&self) -> Vec<String> {
        self.file
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Fn(func) if is_exported(&func.vis) => Some(func.sig.ident.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Whether an exported top-level `static DATA` is declared, whatever its
    /// type or initializer, together with the owning namespace.
    pub fn has_exported_data_variable(&self) -> (bool, Option<&str>) {
        let found = self.file.items.iter().any(|item| {
            matches!(item, Item::Static(var) if var.ident == DATA_VARIABLE && is_exported(&var.vis))
        });
        (found, self.namespace())
    }
}

/// Only `pub` and `pub(crate)` (or `pub(in crate)`) items are reachable from `generated.rs`, which
/// sits at the crate root. `pub(super)`, `pub(in path)` and `pub(self)` are not.
fn is_exported(vis: &Visibility) -> bool {
    match vis {
        Visibility::Public(_) => true,
        Visibility::Restricted(restricted) => restricted.path.is_ident("crate"),
        Visibility::Inherited => false,
    }
}

/// Derive the owning module path from a root-relative file path.
///
/// `blog/posts/data.rs` → `blog::posts`. A file directly under the root has
/// no directory module and therefore no namespace.
fn namespace_of(relative: &Path) -> Option<String> {
    let segments = relative
        .parent()?
        .components()
        .map(|component| match component {
            Component::Normal(name) => name.to_str().filter(|name| is_ident(name)),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    if segments.is_empty() {
        return None;
    }
    Some(segments.join("::"))
}

/// Whether `name` can be used as a module name without raw-identifier syntax.
pub fn is_ident(name: &str) -> bool {
    syn::parse_str::<syn::Ident>(name).is_ok()
}
