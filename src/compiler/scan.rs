//! Convention scanner.
//!
//! Walks the source tree and records, for every directory holding route
//! convention files, which files it has and which `index.html` applies to it.
//!
//! # Markers
//!
//! | Directory      | Effect                                          |
//! |----------------|-------------------------------------------------|
//! | `_drafts`      | skipped together with everything beneath it     |
//! | `marketing_`   | scanned, but left out of derived route paths    |

use super::{
    DATA_FILE, GROUP_SUFFIX, HANDLER_FILE, IGNORED_PREFIX, INDEX_FILE, METADATA_FILE, PAGE_FILE,
    RENDER_FILE,
};
use crate::{error::BuildError, log};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

/// Role a recognized file plays in its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileRole {
    Data,
    Render,
    Handler,
    Page,
    Index,
    Metadata,
}

impl FileRole {
    /// Classify a file by its exact (case-sensitive) base name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            DATA_FILE => Some(Self::Data),
            RENDER_FILE => Some(Self::Render),
            HANDLER_FILE => Some(Self::Handler),
            PAGE_FILE => Some(Self::Page),
            INDEX_FILE => Some(Self::Index),
            METADATA_FILE => Some(Self::Metadata),
            _ => None,
        }
    }

    pub const fn is_template(self) -> bool {
        matches!(self, Self::Page | Self::Index | Self::Metadata)
    }
}

/// A directory under the source root that holds at least one convention
/// file besides `index.html`.
#[derive(Debug, Clone)]
pub struct RouteDirectory {
    /// Directory path as walked (source root joined with `relative`)
    pub path: PathBuf,
    /// Directory path relative to the source root
    pub relative: PathBuf,
    /// Route path: `relative` minus group segments, `/`-joined, no leading slash
    pub route: String,
    /// Recognized files in file-name order, paths relative to the source root
    pub files: Vec<(FileRole, PathBuf)>,
    /// Nearest `index.html` at or above this directory, relative to the source root
    pub index: PathBuf,
}

impl RouteDirectory {
    /// Path of the file playing `role`, if the directory has one.
    pub fn get(&self, role: FileRole) -> Option<&Path> {
        self.files
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, path)| path.as_path())
    }

    pub fn has(&self, role: FileRole) -> bool {
        self.get(role).is_some()
    }

    /// Templates applying to this directory: the resolved index first, then
    /// the directory's own page and metadata templates in discovery order.
    pub fn html_templates(&self) -> Vec<PathBuf> {
        let mut templates = vec![self.index.clone()];
        templates.extend(
            self.files
                .iter()
                .filter(|(role, _)| role.is_template() && *role != FileRole::Index)
                .map(|(_, path)| path.clone()),
        );
        templates
    }

    /// Whether the directory carries its own page-level templates.
    pub fn has_page_templates(&self) -> bool {
        self.has(FileRole::Page) || self.has(FileRole::Metadata)
    }
}

/// Scan `root` and return its route directories in walk order.
///
/// Directories are visited depth-first with entries sorted by file name,
/// so the result is stable across runs and platforms.
pub fn scan_tree(root: &Path) -> Result<Vec<RouteDirectory>, BuildError> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored_dir(entry));

    let mut dirs = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(dir) = scan_directory(root, entry.path())? {
            log!("scan"; "{} {}", display_route(&dir.route), describe(&dir));
            dirs.push(dir);
        }
    }

    Ok(dirs)
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(IGNORED_PREFIX))
}

/// Classify the files directly inside `dir`.
///
/// Returns `None` when nothing but an `index.html` (or nothing at all) is
/// recognized there.
fn scan_directory(root: &Path, dir: &Path) -> Result<Option<RouteDirectory>, BuildError> {
    let read_err = |source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() {
            continue;
        }
        let Some(role) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(FileRole::from_file_name)
        else {
            continue;
        };
        files.push((role, relative_to(root, &path)));
    }

    if files.iter().all(|(role, _)| *role == FileRole::Index) {
        return Ok(None);
    }
    files.sort_by(|(_, a), (_, b)| a.file_name().cmp(&b.file_name()));

    let index = resolve_index(root, dir).ok_or_else(|| BuildError::MissingIndex {
        dir: dir.to_path_buf(),
    })?;
    let relative = relative_to(root, dir);

    Ok(Some(RouteDirectory {
        path: dir.to_path_buf(),
        route: route_path(&relative),
        relative,
        files,
        index: relative_to(root, &index),
    }))
}

/// Find the nearest `index.html` walking from `dir` up to `root`, inclusive.
fn resolve_index(root: &Path, dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .take_while(|ancestor| ancestor.starts_with(root))
        .map(|ancestor| ancestor.join(INDEX_FILE))
        .find(|candidate| candidate.is_file())
}

/// Derive a route path from a root-relative directory path.
///
/// Group segments (trailing marker) are dropped:
/// `marketing_/about` → `about`, `home_` → `` (site root).
pub fn route_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .filter(|segment| !segment.ends_with(GROUP_SUFFIX))
        .collect::<Vec<_>>()
        .join("/")
}

/// Render a relative path with `/` separators regardless of platform.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn display_route(route: &str) -> String {
    format!("/{route}")
}

fn describe(dir: &RouteDirectory) -> String {
    let names: Vec<_> = dir
        .files
        .iter()
        .filter_map(|(_, path)| path.file_name())
        .map(|name| name.to_string_lossy())
        .collect();
    format!("[{}] index: {}", names.join(", "), slash_path(&dir.index))
}
