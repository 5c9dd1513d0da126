//! Registry code synthesizer.
//!
//! Emits a [`RouteRegistry`] as a Rust module (`generated.rs`) that the
//! user's program compiles in and hands to `trellis::run`:
//!
//! ```ignore
//! mod generated;
//!
//! fn main() -> anyhow::Result<()> {
//!     trellis::run(generated::registry())
//! }
//! ```

use super::registry::RouteRegistry;
use crate::{error::BuildError, log};
use std::{fs, path::Path};

const HEADER: &str = "// Code generated by trellis; DO NOT EDIT.";
const RUNTIME_IMPORTS: &str =
    "use trellis::routes::{CustomRender, DataRoute, DefaultHandler, DefaultRender, Registry};";

/// Line-oriented source buffer with four-space indentation.
#[derive(Default)]
struct Source {
    buf: String,
    depth: usize,
}

impl Source {
    fn line(&mut self, text: &str) -> &mut Self {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str("    ");
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    fn open(&mut self, text: &str) -> &mut Self {
        self.line(text);
        self.depth += 1;
        self
    }

    fn close(&mut self, text: &str) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(text)
    }

    /// `pub fn <name>() -> <ty> { <body> }`, with an empty-collection body
    /// when there are no items.
    fn list_fn(&mut self, name: &str, ty: &str, items: &[String]) -> &mut Self {
        self.line("").open(&format!("pub fn {name}() -> {ty} {{"));
        if items.is_empty() {
            self.line("Vec::new()");
        } else {
            self.open("vec![");
            for item in items {
                self.line(&format!("{item},"));
            }
            self.close("]");
        }
        self.close("}")
    }
}

/// Render `registry` as Rust source. Identical input yields identical bytes.
pub fn synthesize(registry: &RouteRegistry) -> String {
    let mut src = Source::default();

    src.line(HEADER)
        .line("")
        .line("use std::collections::BTreeMap;")
        .line(RUNTIME_IMPORTS);
    if !registry.imports.is_empty() {
        src.line("");
        for import in &registry.imports {
            src.line(&format!("use {} as {};", import.path, import.alias));
        }
    }

    src.line("")
        .open("pub fn data_routes() -> BTreeMap<String, DataRoute> {");
    if registry.data_routes.is_empty() {
        src.line("BTreeMap::new()");
    } else {
        src.open("BTreeMap::from([");
        for entry in registry.data_routes.values() {
            let templates = entry
                .templates
                .iter()
                .map(|template| format!("{template:?}"))
                .collect::<Vec<_>>()
                .join(", ");
            src.line(&format!(
                "({:?}.to_string(), DataRoute::new(&{}, [{templates}])),",
                entry.route, entry.data
            ));
        }
        src.close("])");
    }
    src.close("}");

    let custom: Vec<_> = registry
        .custom_renders
        .iter()
        .map(|entry| format!("CustomRender::new({:?}, {})", entry.function, entry.function))
        .collect();
    let renders: Vec<_> = registry
        .default_renders
        .iter()
        .map(|entry| format!("DefaultRender::new({:?}, {})", entry.path, entry.function))
        .collect();
    let handlers: Vec<_> = registry
        .default_handlers
        .iter()
        .map(|entry| format!("DefaultHandler::new({:?}, {})", entry.path, entry.function))
        .collect();

    src.list_fn("render_custom_list", "Vec<CustomRender>", &custom)
        .list_fn("render_default_list", "Vec<DefaultRender>", &renders)
        .list_fn("handler_default_list", "Vec<DefaultHandler>", &handlers);

    src.line("")
        .open("pub fn registry() -> Registry {")
        .open("Registry::new(")
        .line("data_routes(),")
        .line("render_custom_list(),")
        .line("render_default_list(),")
        .line("handler_default_list(),")
        .close(")")
        .close("}");

    src.buf
}

/// Synthesize and write the registry module to `path`.
///
/// Returns `false` when the file already holds identical content and was
/// left untouched, so an unchanged registry never triggers a recompile.
pub fn write_generated(registry: &RouteRegistry, path: &Path) -> Result<bool, BuildError> {
    let source = synthesize(registry);
    if fs::read_to_string(path).is_ok_and(|existing| existing == source) {
        log!("codegen"; "{} is up to date", path.display());
        return Ok(false);
    }

    let failed = |source| BuildError::SynthesisWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(failed)?;
    }
    fs::write(path, source).map_err(failed)?;
    log!("codegen"; "wrote {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::registry::{
        CustomRenderEntry, DataRouteEntry, DefaultHandlerEntry, DefaultRenderEntry, ModuleImport,
    };
    use tempfile::TempDir;

    fn sample() -> RouteRegistry {
        let mut registry = RouteRegistry::default();
        registry.data_routes.insert(
            "about".into(),
            DataRouteEntry {
                route: "about".into(),
                data: "about::data::DATA".into(),
                templates: vec!["about/index.html".into(), "about/page.html".into()],
            },
        );
        registry.custom_renders.push(CustomRenderEntry {
            function: "feeds::render::sitemap_".into(),
        });
        registry.default_renders.push(DefaultRenderEntry {
            path: "/feeds/atom".into(),
            function: "feeds::render::atom".into(),
        });
        registry.default_handlers.push(DefaultHandlerEntry {
            path: "/api".into(),
            function: "api::handler::handler".into(),
        });
        for namespace in ["feeds", "api", "about"] {
            registry.imports.insert(ModuleImport {
                path: format!("crate::site::{namespace}"),
                alias: namespace.into(),
            });
        }
        registry
    }

    #[test]
    fn test_synthesize_layout() {
        let expected = r#"// Code generated by trellis; DO NOT EDIT.

use std::collections::BTreeMap;
use trellis::routes::{CustomRender, DataRoute, DefaultHandler, DefaultRender, Registry};

use crate::site::about as about;
use crate::site::api as api;
use crate::site::feeds as feeds;

pub fn data_routes() -> BTreeMap<String, DataRoute> {
    BTreeMap::from([
        ("about".to_string(), DataRoute::new(&about::data::DATA, ["about/index.html", "about/page.html"])),
    ])
}

pub fn render_custom_list() -> Vec<CustomRender> {
    vec![
        CustomRender::new("feeds::render::sitemap_", feeds::render::sitemap_),
    ]
}

pub fn render_default_list() -> Vec<DefaultRender> {
    vec![
        DefaultRender::new("/feeds/atom", feeds::render::atom),
    ]
}

pub fn handler_default_list() -> Vec<DefaultHandler> {
    vec![
        DefaultHandler::new("/api", api::handler::handler),
    ]
}

pub fn registry() -> Registry {
    Registry::new(
        data_routes(),
        render_custom_list(),
        render_default_list(),
        handler_default_list(),
    )
}
"#;
        assert_eq!(synthesize(&sample()), expected);
    }

    #[test]
    fn test_synthesize_empty_registry() {
        let source = synthesize(&RouteRegistry::default());
        assert!(source.contains("BTreeMap::new()"));
        assert_eq!(source.matches("Vec::new()").count(), 3);
        assert!(!source.contains("use crate::"));
    }

    #[test]
    fn test_string_literals_are_escaped() {
        let mut registry = RouteRegistry::default();
        registry.default_renders.push(DefaultRenderEntry {
            path: "/say\"hi\"".into(),
            function: "x::render::hi".into(),
        });
        assert!(synthesize(&registry).contains(r#"DefaultRender::new("/say\"hi\"", x::render::hi)"#));
    }

    #[test]
    fn test_write_generated_skips_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("src/generated.rs");
        let registry = sample();

        assert!(write_generated(&registry, &path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), synthesize(&registry));
        assert!(!write_generated(&registry, &path).unwrap());
    }

    #[test]
    fn test_write_generated_reports_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let path = blocker.join("generated.rs");
        match write_generated(&sample(), &path) {
            Err(BuildError::SynthesisWrite { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
