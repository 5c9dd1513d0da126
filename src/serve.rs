//! Request dispatcher.
//!
//! Serves a rendered site from the output directory, built on `tiny_http`:
//!
//! - Handlers registered from `handler.rs` modules
//! - Data routes, answering with `page.html` or, for fragment requests,
//!   `page-body.html`
//! - Default renders, answering with their `page.html`
//! - Static files mounted under a URL prefix
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  ┌──────────┐       ┌──────────┐
//! │ Worker 1 │  │ Worker 2 │  ...  │ Worker N │
//! └────┬─────┘  └────┬─────┘       └────┬─────┘
//!      └─────────────┼──────────────────┘
//!                    ▼
//!        &Dispatcher::resolve(path, fragment)
//!                    │
//!      ┌─────────────┼──────────────┬──────────────┐
//!      ▼             ▼              ▼              ▼
//!   handler     data route    default render   static file
//! ```
//!
//! Every route also matches with a single trailing slash, except `/`.

use crate::{
    compiler::{PAGE_BODY_FILE, PAGE_FILE, url_path},
    config::SiteConfig,
    error::BuildError,
    log,
    render::{TemplateRenderer, artifact_dir},
    routes::{FRAGMENT_BLOCK, Registry},
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    io::{self, Cursor},
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
    thread,
};
use tiny_http::{Header, Request, Response, ResponseBox, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Resolution
// ============================================================================

/// What a request path resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Index into the registry's default handlers
    Handler(usize),
    /// File relative to the output root
    Artifact(PathBuf),
    NotFound,
}

/// Routes requests against an immutable [`Registry`].
pub struct Dispatcher {
    registry: Registry,
    renderer: TemplateRenderer,
    static_prefix: String,
    fragment_header: String,
}

impl Dispatcher {
    pub fn new(registry: Registry, config: &SiteConfig) -> Self {
        Self {
            registry,
            renderer: TemplateRenderer::new(&config.build.source, &config.build.output),
            static_prefix: config.serve.static_prefix.clone(),
            fragment_header: config.serve.fragment_header.clone(),
        }
    }

    /// Resolve a decoded request path.
    ///
    /// Precedence: handlers, data routes, default renders, then the static
    /// mount. The first matching entry of each collection wins.
    pub fn resolve(&self, path: &str, fragment: bool) -> Resolution {
        let registry = &self.registry;

        if let Some(index) = registry
            .default_handlers()
            .iter()
            .position(|handler| route_matches(handler.path(), path))
        {
            return Resolution::Handler(index);
        }

        if let Some(route) = registry
            .data_routes()
            .keys()
            .find(|route| route_matches(&url_path(route, None), path))
        {
            let file = if fragment { PAGE_BODY_FILE } else { PAGE_FILE };
            return Resolution::Artifact(Path::new(route).join(file));
        }

        if let Some(render) = registry
            .default_renders()
            .iter()
            .find(|render| route_matches(render.path(), path))
        {
            return Resolution::Artifact(artifact_dir(render.path()).join(PAGE_FILE));
        }

        path.strip_prefix(self.static_prefix.as_str())
            .and_then(static_file)
            .map_or(Resolution::NotFound, Resolution::Artifact)
    }

    /// Bind and serve until Ctrl+C.
    ///
    /// Workers share the dispatcher by reference; each takes requests off
    /// the same listener.
    pub fn serve(&self, config: &SiteConfig) -> Result<()> {
        let interface: IpAddr = config
            .serve
            .interface
            .parse()
            .with_context(|| format!("invalid interface `{}`", config.serve.interface))?;
        let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
        let server = Arc::new(server);
        let workers = config.serve.workers.max(1);

        // Each unblock releases one worker blocked on the listener
        let server_for_signal = Arc::clone(&server);
        ctrlc::set_handler(move || {
            log!("serve"; "shutting down...");
            for _ in 0..workers {
                server_for_signal.unblock();
            }
        })
        .context("Failed to set Ctrl+C handler")?;

        log!("serve"; "http://{} ({} workers)", addr, workers);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    for request in server.incoming_requests() {
                        if let Err(e) = self.handle(request) {
                            log!("serve"; "request error: {e}");
                        }
                    }
                });
            }
        });

        Ok(())
    }

    fn handle(&self, mut request: Request) -> io::Result<()> {
        let path = request_path(request.url());
        let fragment = is_fragment(&request, &self.fragment_header);

        match self.resolve(&path, fragment) {
            Resolution::Handler(index) => {
                let cx = RequestContext {
                    fragment,
                    renderer: &self.renderer,
                };
                let response = self.registry.default_handlers()[index].handle(&mut request, &cx);
                request.respond(response)
            }
            Resolution::Artifact(relative) => {
                serve_file(request, &self.renderer.output_root().join(relative))
            }
            Resolution::NotFound => serve_not_found(request),
        }
    }
}

/// `route` matches `path` exactly or with one trailing slash.
fn route_matches(route: &str, path: &str) -> bool {
    path == route || (route != "/" && path.strip_suffix('/') == Some(route))
}

/// Path below the static mount, rejected when empty or when it could
/// escape the output root.
fn static_file(rest: &str) -> Option<PathBuf> {
    let path = Path::new(rest);
    let safe = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    (!rest.is_empty() && safe).then(|| path.to_path_buf())
}

/// Strip the query string and percent-decode the request URL.
fn request_path(url: &str) -> String {
    let raw = url.split('?').next().unwrap_or(url);
    urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| raw.to_owned())
}

fn is_fragment(request: &Request, header: &str) -> bool {
    request.headers().iter().any(|h| {
        h.field.as_str().as_str().eq_ignore_ascii_case(header) && h.value.as_str() == "true"
    })
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Handler Context
// ============================================================================

/// Per-request context handed to handlers.
pub struct RequestContext<'a> {
    fragment: bool,
    renderer: &'a TemplateRenderer,
}

impl<'a> RequestContext<'a> {
    pub fn new(fragment: bool, renderer: &'a TemplateRenderer) -> Self {
        Self { fragment, renderer }
    }

    /// Whether the client asked for the page body only.
    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        self.renderer
    }

    /// Render `templates` against `content`: the full page, or only its
    /// body block for fragment requests.
    pub fn render<S: Serialize>(
        &self,
        templates: &[PathBuf],
        content: S,
    ) -> Result<String, BuildError> {
        let block = self.fragment.then_some(FRAGMENT_BLOCK);
        self.renderer.render_to_string(templates, content, block)
    }

    /// [`render`](Self::render) as an HTML response; failures become a 500.
    pub fn respond<S: Serialize>(&self, templates: &[PathBuf], content: S) -> ResponseBox {
        match self.render(templates, content) {
            Ok(html) => html_response(html),
            Err(e) => {
                log!("error"; "{e}");
                Response::from_string("500 Internal Server Error")
                    .with_status_code(500)
                    .boxed()
            }
        }
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

fn content_type(value: &str) -> Header {
    Header::from_bytes("Content-Type", value).expect("content type is valid ASCII")
}

/// An HTML response with status 200.
pub fn html_response(html: String) -> ResponseBox {
    Response::from_string(html)
        .with_header(content_type("text/html; charset=utf-8"))
        .boxed()
}

/// Serve a file with appropriate content type, or 404 when it is missing.
fn serve_file(request: Request, path: &Path) -> io::Result<()> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return serve_not_found(request),
        Err(e) if e.kind() == io::ErrorKind::IsADirectory => return serve_not_found(request),
        Err(e) => return Err(e),
    };

    let response = Response::from_data(content).with_header(content_type(guess_content_type(path)));
    request.respond(response)
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> io::Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![content_type("text/plain")],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",

        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{DataRoute, DefaultHandler, DefaultRender, PageData, RenderOutput};
    use minijinja::{Value, context};
    use std::{
        collections::BTreeMap,
        io::{Read, Write},
        net::TcpStream,
    };
    use tempfile::TempDir;
    use tiny_http::TestRequest;

    static PAGE: PageData = PageData::new(page, &[]);

    fn page() -> Value {
        context! {}
    }

    fn card() -> RenderOutput {
        RenderOutput::new((), ["card.html"])
    }

    fn ok(_: &mut Request, _: &RequestContext<'_>) -> ResponseBox {
        Response::empty(200).boxed()
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with(&SiteConfig::default())
    }

    fn dispatcher_with(config: &SiteConfig) -> Dispatcher {
        let registry = Registry::new(
            BTreeMap::from([
                ("".to_string(), DataRoute::new(&PAGE, ["index.html"])),
                ("about".to_string(), DataRoute::new(&PAGE, ["index.html"])),
                ("api".to_string(), DataRoute::new(&PAGE, ["index.html"])),
            ]),
            Vec::new(),
            vec![
                DefaultRender::new("/cards/card", card),
                DefaultRender::new("/about", card),
            ],
            vec![DefaultHandler::new("/api", ok), DefaultHandler::new("/api/status", ok)],
        );
        Dispatcher::new(registry, config)
    }

    /// Dispatcher whose output root is `output`.
    fn dispatcher_serving(output: &Path) -> Dispatcher {
        let mut config = SiteConfig::default();
        config.build.output = output.to_path_buf();
        dispatcher_with(&config)
    }

    /// Send one raw HTTP request through `handle` and return the raw response.
    fn exchange(d: &Dispatcher, request: &str) -> String {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let raw = request.to_owned();
        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(raw.as_bytes()).unwrap();
            let mut response = String::new();
            stream.read_to_string(&mut response).unwrap();
            response
        });

        d.handle(server.recv().unwrap()).unwrap();
        client.join().unwrap()
    }

    fn get(path: &str, headers: &str) -> String {
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n{headers}Connection: close\r\n\r\n")
    }

    fn header(field: &str, value: &str) -> Header {
        Header::from_bytes(field, value).unwrap()
    }

    #[test]
    fn test_handlers_take_precedence() {
        let d = dispatcher();
        assert_eq!(d.resolve("/api", false), Resolution::Handler(0));
        assert_eq!(d.resolve("/api/", false), Resolution::Handler(0));
        assert_eq!(d.resolve("/api/status", true), Resolution::Handler(1));
    }

    #[test]
    fn test_data_route_full_and_fragment() {
        let d = dispatcher();
        assert_eq!(
            d.resolve("/about", false),
            Resolution::Artifact(PathBuf::from("about/page.html"))
        );
        assert_eq!(
            d.resolve("/about/", true),
            Resolution::Artifact(PathBuf::from("about/page-body.html"))
        );
        assert_eq!(d.resolve("/", false), Resolution::Artifact(PathBuf::from("page.html")));
    }

    #[test]
    fn test_default_render_serves_page_only() {
        let d = dispatcher();
        let expected = Resolution::Artifact(PathBuf::from("cards/card/page.html"));
        assert_eq!(d.resolve("/cards/card", false), expected);
        assert_eq!(d.resolve("/cards/card", true), expected);
    }

    #[test]
    fn test_static_mount() {
        let d = dispatcher();
        assert_eq!(
            d.resolve("/static/css/site.css", false),
            Resolution::Artifact(PathBuf::from("css/site.css"))
        );
        assert_eq!(d.resolve("/static/", false), Resolution::NotFound);
        assert_eq!(d.resolve("/static/../secret", false), Resolution::NotFound);
        assert_eq!(d.resolve("/missing", false), Resolution::NotFound);
        assert_eq!(d.resolve("/about//", false), Resolution::NotFound);
    }

    #[test]
    fn test_fragment_header() {
        let fragment =
            |h: Header| is_fragment(&Request::from(TestRequest::new().with_header(h)), "HX-Request");

        assert!(fragment(header("HX-Request", "true")));
        assert!(fragment(header("hx-request", "true")));
        assert!(!fragment(header("HX-Request", "false")));
        assert!(!fragment(header("HX-Request", "TRUE")));
        assert!(!fragment(header("X-Requested-With", "true")));
        assert!(!is_fragment(&Request::from(TestRequest::new()), "HX-Request"));
    }

    #[test]
    fn test_handle_serves_fragment_artifact() {
        let output = TempDir::new().unwrap();
        fs::create_dir_all(output.path().join("about")).unwrap();
        fs::write(output.path().join("about/page.html"), "<html>full</html>").unwrap();
        fs::write(output.path().join("about/page-body.html"), "body only").unwrap();
        let d = dispatcher_serving(output.path());

        let full = exchange(&d, &get("/about", ""));
        assert!(full.starts_with("HTTP/1.1 200"), "{full}");
        assert!(full.ends_with("<html>full</html>"), "{full}");

        let fragment = exchange(&d, &get("/about/", "hx-request: true\r\n"));
        assert!(fragment.starts_with("HTTP/1.1 200"), "{fragment}");
        assert!(fragment.ends_with("body only"), "{fragment}");
    }

    #[test]
    fn test_handle_missing_artifact_is_not_found() {
        let output = TempDir::new().unwrap();
        let d = dispatcher_serving(output.path());
        assert_eq!(
            d.resolve("/cards/card", false),
            Resolution::Artifact(PathBuf::from("cards/card/page.html"))
        );

        let response = exchange(&d, &get("/cards/card", ""));
        assert!(response.starts_with("HTTP/1.1 404"), "{response}");
        assert!(response.ends_with("404 Not Found"), "{response}");
    }

    #[test]
    fn test_handle_runs_handler() {
        let output = TempDir::new().unwrap();
        let d = dispatcher_serving(output.path());

        let response = exchange(&d, &get("/api/status", ""));
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/about?x=1"), "/about");
        assert_eq!(request_path("/my%20page/"), "/my page/");
        assert_eq!(request_path("/"), "/");
    }

    #[test]
    fn test_route_matches() {
        assert!(route_matches("/about", "/about"));
        assert!(route_matches("/about", "/about/"));
        assert!(!route_matches("/about", "/about/x"));
        assert!(route_matches("/", "/"));
        assert!(!route_matches("/", ""));
    }

    #[test]
    fn test_request_context_render() {
        let source = TempDir::new().unwrap();
        fs::write(
            source.path().join("index.html"),
            "<html>{% block body %}<p>{{ name }}</p>{% endblock %}</html>",
        )
        .unwrap();
        let renderer = TemplateRenderer::new(source.path(), source.path());
        let templates = [PathBuf::from("index.html")];

        let full = RequestContext::new(false, &renderer);
        assert!(!full.is_fragment());
        assert_eq!(
            full.render(&templates, context! { name => "x" }).unwrap(),
            "<html><p>x</p></html>"
        );

        let fragment = RequestContext::new(true, &renderer);
        assert_eq!(
            fragment.render(&templates, context! { name => "x" }).unwrap(),
            "<p>x</p>"
        );
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/page.html")), "text/html; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("site.css")), "text/css; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("blob")), "application/octet-stream");
    }
}
