//! Template execution and the static renderer.
//!
//! Templates are loaded from the source tree and registered under their base
//! names, so `{% include "page.html" %}` inside an `index.html` picks up the
//! directory's page regardless of where the index was inherited from. When
//! two templates share a base name, the later one wins.
//!
//! # Artifacts
//!
//! ```text
//! data route "about"        → about/page.html + about/page-body.html
//! default render "/cards/x" → cards/x/page.html
//! custom render             → wherever it writes
//! ```

use crate::{
    compiler::{PAGE_BODY_FILE, PAGE_FILE},
    error::BuildError,
    log,
    routes::{FRAGMENT_BLOCK, Registry},
    utils::log::Progress,
};
use anyhow::{Context, Result};
use minijinja::{Environment, ErrorKind};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Executes template sets against content and writes the results under the
/// output root.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    source_root: PathBuf,
    output_root: PathBuf,
}

impl TemplateRenderer {
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Execute `templates` (source-root relative, entry first) against `content`.
    ///
    /// With `block`, a template of that name is rendered when one is loaded;
    /// otherwise the named block of the entry template is.
    pub fn render_to_string<S: Serialize>(
        &self,
        templates: &[PathBuf],
        content: S,
        block: Option<&str>,
    ) -> Result<String, BuildError> {
        let target = templates
            .first()
            .map(|entry| entry.display().to_string())
            .unwrap_or_default();
        let failed = |source| BuildError::TemplateExecution {
            target: target.clone(),
            source,
        };

        let Some(entry) = templates.first().map(|path| template_name(path)) else {
            return Err(failed(minijinja::Error::new(
                ErrorKind::TemplateNotFound,
                "no templates to render",
            )));
        };
        let env = self.environment(templates)?;

        let rendered = match block {
            Some(name) if env.get_template(name).is_ok() => {
                env.get_template(name).and_then(|tmpl| tmpl.render(&content))
            }
            Some(name) => env.get_template(&entry).and_then(|tmpl| {
                tmpl.render_captured(&content)?
                    .with_state_mut(|state| state.render_block(name))
            }),
            None => env.get_template(&entry).and_then(|tmpl| tmpl.render(&content)),
        };
        rendered.map_err(failed)
    }

    /// Render and write to `destination`, relative to the output root.
    pub fn render_to<S: Serialize>(
        &self,
        destination: &Path,
        templates: &[PathBuf],
        content: S,
        block: Option<&str>,
    ) -> Result<PathBuf, BuildError> {
        let html = self.render_to_string(templates, content, block)?;
        let path = self.output_root.join(destination);
        write_artifact(&path, &html)?;
        Ok(path)
    }

    fn environment(&self, templates: &[PathBuf]) -> Result<Environment<'static>, BuildError> {
        let mut env = Environment::new();
        for template in templates {
            let path = self.source_root.join(template);
            let source = fs::read_to_string(&path).map_err(|source| BuildError::Io {
                path: path.clone(),
                source,
            })?;
            env.add_template_owned(template_name(template), source)
                .map_err(|source| BuildError::TemplateExecution {
                    target: template.display().to_string(),
                    source,
                })?;
        }
        Ok(env)
    }
}

fn template_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_artifact(path: &Path, html: &str) -> Result<(), BuildError> {
    let failed = |source| BuildError::RenderWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(failed)?;
    }
    fs::write(path, html).map_err(failed)
}

/// Output directory for a URL path: `/cards/x` → `cards/x`, `/` → ``.
pub fn artifact_dir(url_path: &str) -> &Path {
    Path::new(url_path.trim_start_matches('/'))
}

/// Render every data route, default render and custom render in the registry.
///
/// Stops at the first failure; artifacts written before it stay on disk.
pub fn render_static(registry: &Registry, renderer: &TemplateRenderer) -> Result<()> {
    let total = registry.data_routes().len()
        + registry.default_renders().len()
        + registry.custom_renders().len();
    let progress = Progress::new("render", total);

    for (route, page) in registry.data_routes() {
        let templates = page.templates();
        let content = page.content();
        let dir = Path::new(route);
        renderer.render_to(&dir.join(PAGE_FILE), &templates, &content, None)?;
        renderer.render_to(
            &dir.join(PAGE_BODY_FILE),
            &templates,
            &content,
            Some(FRAGMENT_BLOCK),
        )?;
        progress.inc();
    }

    for entry in registry.default_renders() {
        let output = entry.render();
        renderer.render_to(
            &artifact_dir(entry.path()).join(PAGE_FILE),
            &output.templates,
            &output.content,
            output.block.as_deref(),
        )?;
        progress.inc();
    }

    for entry in registry.custom_renders() {
        entry
            .render(renderer)
            .with_context(|| format!("custom render `{}` failed", entry.name()))?;
        progress.inc();
    }

    progress.finish();
    log!("render"; "{} entries rendered into {}", total, renderer.output_root().display());
    Ok(())
}
