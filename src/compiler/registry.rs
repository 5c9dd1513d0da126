//! Registry builder.
//!
//! Combines scanner output with each directory's module surface into the
//! four registry collections plus the import set.
//!
//! # Precedence per directory
//!
//! ```text
//! data.rs exporting DATA ──► data route (index template first)
//!        else page.html  ──► rendered right away as a generic page
//! render.rs  ──► name ends with `_` ? custom render : default render
//! handler.rs ──► name ends with `_` ? skipped       : default handler
//! ```
//!
//! Collections follow directory discovery order, then declaration order
//! within a module. Data routes are keyed (and therefore sorted) by route
//! path, imports are sorted by module path, so generated output does not
//! depend on scheduling.

use super::{
    CUSTOM_SUFFIX, DATA_VARIABLE, FileRole, PAGE_FILE, ROOT_HANDLER, ROOT_RENDER,
    extract::SourceModule,
    scan::{RouteDirectory, slash_path},
    url_path,
};
use crate::{error::BuildError, log, render::TemplateRenderer};
use rayon::prelude::*;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

const DATA_MODULE: &str = "data";
const RENDER_MODULE: &str = "render";
const HANDLER_MODULE: &str = "handler";

/// A `use` line in generated code: `use <path> as <alias>;`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModuleImport {
    pub path: String,
    pub alias: String,
}

/// Names the generated module already brings into scope. An alias equal to
/// one of them would clash with or shadow it.
const RESERVED_ALIASES: &[&str] = &[
    "std",
    "core",
    "alloc",
    "trellis",
    "BTreeMap",
    "CustomRender",
    "DataRoute",
    "DefaultHandler",
    "DefaultRender",
    "Registry",
];

/// A page rendered from a data module's `DATA` plus the directory templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRouteEntry {
    pub route: String,
    /// Path of the `DATA` static, relative to its import alias
    pub data: String,
    /// Root-relative template paths, index first
    pub templates: Vec<String>,
}

/// A render function that decides on its own where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRenderEntry {
    pub function: String,
}

/// A render function whose output lands at `path/page.html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRenderEntry {
    pub path: String,
    pub function: String,
}

/// A request handler bound to `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultHandlerEntry {
    pub path: String,
    pub function: String,
}

/// The symbolic registry handed to the code synthesizer.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    pub data_routes: BTreeMap<String, DataRouteEntry>,
    pub custom_renders: Vec<CustomRenderEntry>,
    pub default_renders: Vec<DefaultRenderEntry>,
    pub default_handlers: Vec<DefaultHandlerEntry>,
    pub imports: BTreeSet<ModuleImport>,
}

impl RouteRegistry {
    pub fn is_empty(&self) -> bool {
        self.data_routes.is_empty()
            && self.custom_renders.is_empty()
            && self.default_renders.is_empty()
            && self.default_handlers.is_empty()
    }

    /// Register `prefix::namespace` and return its alias.
    ///
    /// The alias is the namespace joined with `_` (`blog::posts` →
    /// `blog_posts`). When that name is reserved or already bound to another
    /// module, a counter is appended (`blog_posts_1`). Directories arrive in
    /// walk order, so the assignment is stable across runs.
    fn import(&mut self, prefix: &str, namespace: &str) -> String {
        let path = format!("{prefix}::{namespace}");
        if let Some(existing) = self.imports.iter().find(|import| import.path == path) {
            return existing.alias.clone();
        }

        let base = namespace.replace("::", "_");
        let mut alias = base.clone();
        let mut counter = 0;
        while self.alias_taken(&alias) {
            counter += 1;
            alias = format!("{base}_{counter}");
        }

        self.imports.insert(ModuleImport {
            path,
            alias: alias.clone(),
        });
        alias
    }

    fn alias_taken(&self, alias: &str) -> bool {
        RESERVED_ALIASES.contains(&alias) || self.imports.iter().any(|import| import.alias == alias)
    }
}

/// Exported surface of one module, detached from its syntax tree so it can
/// cross thread boundaries.
struct ModuleSurface {
    path: PathBuf,
    namespace: Option<String>,
    functions: Vec<String>,
    has_data: bool,
}

impl ModuleSurface {
    fn read(path: &Path, root: &Path) -> Result<Self, BuildError> {
        let module = SourceModule::parse(path, root)?;
        let (has_data, namespace) = module.has_exported_data_variable();
        Ok(Self {
            path: path.to_path_buf(),
            namespace: namespace.map(str::to_owned),
            functions: module.exported_functions(),
            has_data,
        })
    }

    /// Namespace, or a warning and `None` when the module cannot be referenced.
    fn namespace(&self) -> Option<&str> {
        if self.namespace.is_none() {
            log!("warn"; "skipping {}: its directory is not a valid module path", self.path.display());
        }
        self.namespace.as_deref()
    }
}

struct DirectoryModules {
    data: Option<ModuleSurface>,
    render: Option<ModuleSurface>,
    handler: Option<ModuleSurface>,
}

impl DirectoryModules {
    fn read(dir: &RouteDirectory, root: &Path) -> Result<Self, BuildError> {
        let read = |role| {
            dir.get(role)
                .map(|relative| ModuleSurface::read(&root.join(relative), root))
                .transpose()
        };
        Ok(Self {
            data: read(FileRole::Data)?,
            render: read(FileRole::Render)?,
            handler: read(FileRole::Handler)?,
        })
    }
}

/// Builds a [`RouteRegistry`] from scanned route directories.
pub struct RegistryBuilder<'a> {
    root: &'a Path,
    import_prefix: &'a str,
    renderer: &'a TemplateRenderer,
}

impl<'a> RegistryBuilder<'a> {
    /// `renderer` is used for generic pages, which are rendered during the
    /// build since they bind no data.
    pub fn new(root: &'a Path, import_prefix: &'a str, renderer: &'a TemplateRenderer) -> Self {
        Self {
            root,
            import_prefix,
            renderer,
        }
    }

    pub fn build(&self, dirs: &[RouteDirectory]) -> Result<RouteRegistry, BuildError> {
        // Parsing is independent per directory; accumulation stays sequential.
        let modules = dirs
            .par_iter()
            .map(|dir| DirectoryModules::read(dir, self.root))
            .collect::<Result<Vec<_>, _>>()?;

        let mut registry = RouteRegistry::default();
        for (dir, modules) in dirs.iter().zip(&modules) {
            self.add_page(&mut registry, dir, modules.data.as_ref())?;
            if let Some(render) = &modules.render {
                self.add_renders(&mut registry, dir, render);
            }
            if let Some(handler) = &modules.handler {
                self.add_handlers(&mut registry, dir, handler);
            }
        }

        log!(
            "registry";
            "{} data routes, {} custom renders, {} default renders, {} handlers",
            registry.data_routes.len(),
            registry.custom_renders.len(),
            registry.default_renders.len(),
            registry.default_handlers.len()
        );
        Ok(registry)
    }

    /// Data route when `data.rs` exports `DATA`, otherwise a generic page.
    fn add_page(
        &self,
        registry: &mut RouteRegistry,
        dir: &RouteDirectory,
        data: Option<&ModuleSurface>,
    ) -> Result<(), BuildError> {
        let Some(data) = data else {
            if dir.has_page_templates() {
                self.render_generic(dir)?;
            }
            return Ok(());
        };

        if !data.has_data {
            log!("warn"; "{} exports no `static {DATA_VARIABLE}`", data.path.display());
            return Ok(());
        }
        let Some(namespace) = data.namespace() else {
            return Ok(());
        };

        let alias = registry.import(self.import_prefix, namespace);
        let entry = DataRouteEntry {
            route: dir.route.clone(),
            data: format!("{alias}::{DATA_MODULE}::{DATA_VARIABLE}"),
            templates: dir.html_templates().iter().map(|p| slash_path(p)).collect(),
        };
        if registry.data_routes.insert(dir.route.clone(), entry).is_some() {
            log!("warn"; "data route `{}` redefined by {}", dir.route, dir.path.display());
        }
        Ok(())
    }

    /// Render a data-less page directory to `<route>/page.html`.
    fn render_generic(&self, dir: &RouteDirectory) -> Result<(), BuildError> {
        let templates = dir.html_templates();
        let has_page = templates
            .iter()
            .any(|template| template.file_name().is_some_and(|name| name == PAGE_FILE));
        if !has_page {
            return Err(BuildError::MissingPageTemplate {
                dir: dir.path.clone(),
            });
        }

        let destination = Path::new(&dir.route).join(PAGE_FILE);
        self.renderer
            .render_to(&destination, &templates, minijinja::context! {}, None)?;
        log!("render"; "{}", slash_path(&destination));
        Ok(())
    }

    fn add_renders(&self, registry: &mut RouteRegistry, dir: &RouteDirectory, render: &ModuleSurface) {
        if render.functions.is_empty() {
            return;
        }
        let Some(namespace) = render.namespace() else {
            return;
        };

        let alias = registry.import(self.import_prefix, namespace);
        for name in &render.functions {
            let function = format!("{alias}::{RENDER_MODULE}::{name}");
            if name.ends_with(CUSTOM_SUFFIX) {
                registry.custom_renders.push(CustomRenderEntry { function });
            } else {
                registry.default_renders.push(DefaultRenderEntry {
                    path: entry_path(&dir.route, name, ROOT_RENDER),
                    function,
                });
            }
        }
    }

    fn add_handlers(
        &self,
        registry: &mut RouteRegistry,
        dir: &RouteDirectory,
        handler: &ModuleSurface,
    ) {
        if handler.functions.is_empty() {
            return;
        }
        let Some(namespace) = handler.namespace() else {
            return;
        };

        let alias = registry.import(self.import_prefix, namespace);
        registry.default_handlers.extend(
            handler
                .functions
                .iter()
                .filter(|name| !name.ends_with(CUSTOM_SUFFIX))
                .map(|name| DefaultHandlerEntry {
                    path: entry_path(&dir.route, name, ROOT_HANDLER),
                    function: format!("{alias}::{HANDLER_MODULE}::{name}"),
                }),
        );
    }
}

/// The root function serves the directory's route; any other function
/// serves a lower-cased sub-path named after it.
fn entry_path(route: &str, function: &str, root_name: &str) -> String {
    if function == root_name {
        url_path(route, None)
    } else {
        url_path(route, Some(&function.to_lowercase()))
    }
}
