//! Build orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()                       (stage one, no registry compiled in)
//!     │
//!     ├── scan_tree()         ──► route directories
//!     ├── RegistryBuilder     ──► RouteRegistry, generic pages rendered
//!     └── write_generated()   ──► generated.rs
//!
//! render_site(registry)              (stage two, registry compiled in)
//!     │
//!     └── render_static()     ──► page.html / page-body.html per route
//! ```

use crate::{
    compiler::{RegistryBuilder, RouteRegistry, scan_tree, write_generated},
    config::SiteConfig,
    log,
    render::{TemplateRenderer, render_static},
    routes::Registry,
};
use anyhow::{Context, Result};

/// Scan the source tree and write the generated registry module.
///
/// Generic pages are rendered along the way since they need no compiled
/// data. Returns the symbolic registry that was written.
pub fn build_site(config: &SiteConfig) -> Result<RouteRegistry> {
    let source = &config.build.source;
    let renderer = renderer(config);

    log!("scan"; "{}", source.display());
    let dirs = scan_tree(source)
        .with_context(|| format!("Failed to scan `{}`", source.display()))?;
    log!("scan"; "found {} route directories", dirs.len());

    let registry = RegistryBuilder::new(source, &config.build.import_prefix, &renderer)
        .build(&dirs)
        .context("Failed to build route registry")?;

    write_generated(&registry, &config.build.generated)?;
    Ok(registry)
}

/// Render every route of a compiled registry into the output directory.
pub fn render_site(registry: &Registry, config: &SiteConfig) -> Result<()> {
    render_static(registry, &renderer(config)).context("Failed to render site")
}

fn renderer(config: &SiteConfig) -> TemplateRenderer {
    TemplateRenderer::new(&config.build.source, &config.build.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.source = root.join("site");
        config.build.output = root.join("public");
        config.build.generated = root.join("src/generated.rs");
        config
    }

    #[test]
    fn test_build_site_writes_registry_and_generic_pages() {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        write(
            &site,
            "index.html",
            "<html>{% block body %}{% include \"page.html\" ignore missing %}{% endblock %}</html>",
        );
        write(&site, "about/data.rs", "pub static DATA: PageData = PageData::new(content, &[]);");
        write(&site, "about/page.html", "{{ title }}");
        write(&site, "api/handler.rs", "pub fn handler() {}\npub fn status() {}");
        write(&site, "contact/page.html", "contact us");
        write(&site, "_drafts/page.html", "{% broken");

        let config = config(dir.path());
        let registry = build_site(&config).unwrap();
        assert_eq!(registry.data_routes.len(), 1);
        assert_eq!(registry.default_handlers.len(), 2);

        let generated = fs::read_to_string(&config.build.generated).unwrap();
        assert!(generated.starts_with("// Code generated by trellis; DO NOT EDIT."));
        assert!(generated.contains("use crate::site::about as about;"));
        assert!(generated.contains(
            r#"("about".to_string(), DataRoute::new(&about::data::DATA, ["index.html", "about/page.html"])),"#
        ));
        assert!(generated.contains(r#"DefaultHandler::new("/api/status", api::handler::status),"#));

        let contact = fs::read_to_string(dir.path().join("public/contact/page.html")).unwrap();
        assert_eq!(contact, "<html>contact us</html>");
        assert!(!dir.path().join("public/about").exists());
    }

    #[test]
    fn test_build_site_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("site");
        write(&site, "index.html", "{% block body %}{% endblock %}");
        for name in ["zeta", "alpha", "mid"] {
            write(&site, &format!("{name}/render.rs"), "pub fn render() {}\npub fn card() {}");
            write(&site, &format!("{name}/data.rs"), "pub static DATA: u8 = 0;");
        }

        let config = config(dir.path());
        build_site(&config).unwrap();
        let first = fs::read_to_string(&config.build.generated).unwrap();
        fs::remove_file(&config.build.generated).unwrap();
        build_site(&config).unwrap();
        assert_eq!(fs::read_to_string(&config.build.generated).unwrap(), first);

        let alpha = first.find("\"/alpha\"").unwrap();
        let mid = first.find("\"/mid\"").unwrap();
        let zeta = first.find("\"/zeta\"").unwrap();
        assert!(alpha < mid && mid < zeta);
    }

    #[test]
    fn test_build_site_missing_index() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("site"), "about/page.html", "about");

        let err = build_site(&config(dir.path())).unwrap_err();
        assert!(format!("{err:#}").contains("missing index.html"));
        assert!(!dir.path().join("src/generated.rs").exists());
    }
}
