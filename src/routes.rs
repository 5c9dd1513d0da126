//! Runtime route registry.
//!
//! These are the types the generated `generated.rs` instantiates. Each
//! callable a route module exports is held behind a capability trait:
//!
//! | Trait            | Exported as                                   | Produces                  |
//! |------------------|-----------------------------------------------|---------------------------|
//! | [`PageSource`]   | `pub static DATA: PageData` in `data.rs`      | content + extra templates |
//! | [`RenderFn`]     | `pub fn card() -> RenderOutput` in `render.rs`| one rendered page         |
//! | [`CustomRenderFn`]| `pub fn feed_(&TemplateRenderer) -> Result<()>` | whatever it writes itself |
//! | [`HandlerFn`]    | `pub fn handler(&mut Request, &RequestContext) -> ResponseBox` | an HTTP response |
//!
//! A [`Registry`] is built once at process start and handed by value to the
//! static renderer and the dispatcher; nothing here is global.

use crate::{render::TemplateRenderer, serve::RequestContext};
use minijinja::Value;
use serde::Serialize;
use std::{collections::BTreeMap, path::PathBuf};
use tiny_http::{Request, ResponseBox};

/// Block rendered for fragment (partial-update) responses.
pub const FRAGMENT_BLOCK: &str = "body";

// ============================================================================
// Capabilities
// ============================================================================

/// Data bound to a data route's templates.
pub trait PageSource: Sync {
    fn content(&self) -> Value;

    /// Templates appended after the directory's own templates.
    fn templates(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// A default render function.
pub trait RenderFn: Send + Sync {
    fn render(&self) -> RenderOutput;
}

impl<F> RenderFn for F
where
    F: Fn() -> RenderOutput + Send + Sync,
{
    fn render(&self) -> RenderOutput {
        self()
    }
}

/// A custom render function; it writes its own output.
pub trait CustomRenderFn: Send + Sync {
    fn render(&self, renderer: &TemplateRenderer) -> anyhow::Result<()>;
}

impl<F> CustomRenderFn for F
where
    F: Fn(&TemplateRenderer) -> anyhow::Result<()> + Send + Sync,
{
    fn render(&self, renderer: &TemplateRenderer) -> anyhow::Result<()> {
        self(renderer)
    }
}

/// A request handler.
pub trait HandlerFn: Send + Sync {
    fn handle(&self, request: &mut Request, cx: &RequestContext<'_>) -> ResponseBox;
}

impl<F> HandlerFn for F
where
    F: Fn(&mut Request, &RequestContext<'_>) -> ResponseBox + Send + Sync,
{
    fn handle(&self, request: &mut Request, cx: &RequestContext<'_>) -> ResponseBox {
        self(request, cx)
    }
}

// ============================================================================
// Values exported by route modules
// ============================================================================

/// Content of a data route, declared as `pub static DATA: PageData`.
///
/// ```ignore
/// use trellis::{PageData, Value, context};
///
/// pub static DATA: PageData = PageData::new(content, &["components/card.html"]);
///
/// fn content() -> Value {
///     context! { title => "About" }
/// }
/// ```
pub struct PageData {
    content: fn() -> Value,
    templates: &'static [&'static str],
}

impl PageData {
    pub const fn new(content: fn() -> Value, templates: &'static [&'static str]) -> Self {
        Self { content, templates }
    }
}

impl PageSource for PageData {
    fn content(&self) -> Value {
        (self.content)()
    }

    fn templates(&self) -> Vec<PathBuf> {
        self.templates.iter().map(PathBuf::from).collect()
    }
}

/// What a default render function returns: content, templates, and an
/// optional block (or template name) to render instead of the entry template.
pub struct RenderOutput {
    pub content: Value,
    pub templates: Vec<PathBuf>,
    pub block: Option<String>,
}

impl RenderOutput {
    pub fn new<S, I, P>(content: S, templates: I) -> Self
    where
        S: Serialize,
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            content: Value::from_serialize(content),
            templates: templates.into_iter().map(Into::into).collect(),
            block: None,
        }
    }

    pub fn block(mut self, name: impl Into<String>) -> Self {
        self.block = Some(name.into());
        self
    }
}

// ============================================================================
// Registry entries
// ============================================================================

/// A data route: directory templates bound to a [`PageSource`].
pub struct DataRoute {
    data: &'static dyn PageSource,
    templates: Vec<PathBuf>,
}

impl DataRoute {
    pub fn new<I, P>(data: &'static dyn PageSource, templates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            data,
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }

    /// Directory templates followed by the ones the data source adds.
    pub fn templates(&self) -> Vec<PathBuf> {
        let mut templates = self.templates.clone();
        templates.extend(self.data.templates());
        templates
    }

    pub fn content(&self) -> Value {
        self.data.content()
    }
}

pub struct CustomRender {
    name: String,
    render: Box<dyn CustomRenderFn>,
}

impl CustomRender {
    pub fn new(name: impl Into<String>, render: impl CustomRenderFn + 'static) -> Self {
        Self {
            name: name.into(),
            render: Box::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, renderer: &TemplateRenderer) -> anyhow::Result<()> {
        self.render.render(renderer)
    }
}

pub struct DefaultRender {
    path: String,
    render: Box<dyn RenderFn>,
}

impl DefaultRender {
    pub fn new(path: impl Into<String>, render: impl RenderFn + 'static) -> Self {
        Self {
            path: path.into(),
            render: Box::new(render),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn render(&self) -> RenderOutput {
        self.render.render()
    }
}

pub struct DefaultHandler {
    path: String,
    handler: Box<dyn HandlerFn>,
}

impl DefaultHandler {
    pub fn new(path: impl Into<String>, handler: impl HandlerFn + 'static) -> Self {
        Self {
            path: path.into(),
            handler: Box::new(handler),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handle(&self, request: &mut Request, cx: &RequestContext<'_>) -> ResponseBox {
        self.handler.handle(request, cx)
    }
}

/// The four route collections, immutable once constructed.
#[derive(Default)]
pub struct Registry {
    data_routes: BTreeMap<String, DataRoute>,
    custom_renders: Vec<CustomRender>,
    default_renders: Vec<DefaultRender>,
    default_handlers: Vec<DefaultHandler>,
}

impl Registry {
    pub fn new(
        data_routes: BTreeMap<String, DataRoute>,
        custom_renders: Vec<CustomRender>,
        default_renders: Vec<DefaultRender>,
        default_handlers: Vec<DefaultHandler>,
    ) -> Self {
        Self {
            data_routes,
            custom_renders,
            default_renders,
            default_handlers,
        }
    }

    /// Data routes keyed by route path (no leading slash).
    pub fn data_routes(&self) -> &BTreeMap<String, DataRoute> {
        &self.data_routes
    }

    pub fn custom_renders(&self) -> &[CustomRender] {
        &self.custom_renders
    }

    pub fn default_renders(&self) -> &[DefaultRender] {
        &self.default_renders
    }

    pub fn default_handlers(&self) -> &[DefaultHandler] {
        &self.default_handlers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    static ABOUT: PageData = PageData::new(about, &["components/card.html"]);

    fn about() -> Value {
        context! { title => "About" }
    }

    #[test]
    fn test_data_route_appends_source_templates() {
        let route = DataRoute::new(&ABOUT, ["about/index.html", "about/page.html"]);
        assert_eq!(
            route.templates(),
            [
                PathBuf::from("about/index.html"),
                PathBuf::from("about/page.html"),
                PathBuf::from("components/card.html"),
            ]
        );
        assert_eq!(route.content().get_attr("title").unwrap().as_str(), Some("About"));
    }

    #[test]
    fn test_render_output_builder() {
        let output = RenderOutput::new(context! { n => 1 }, ["cards/card.html"]).block("card");
        assert_eq!(output.templates, [PathBuf::from("cards/card.html")]);
        assert_eq!(output.block.as_deref(), Some("card"));
    }

    #[test]
    fn test_entries_wrap_plain_functions() {
        fn card() -> RenderOutput {
            RenderOutput::new((), ["card.html"])
        }
        fn feed_(_: &TemplateRenderer) -> anyhow::Result<()> {
            Ok(())
        }

        let render = DefaultRender::new("/cards/card", card);
        assert_eq!(render.path(), "/cards/card");
        assert_eq!(render.render().templates, [PathBuf::from("card.html")]);

        let custom = CustomRender::new("cards::render::feed_", feed_);
        let renderer = TemplateRenderer::new("site", "public");
        assert!(custom.render(&renderer).is_ok());
        assert_eq!(custom.name(), "cards::render::feed_");
    }
}
