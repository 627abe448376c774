//! Local preview server for the built site.
//!
//! Serves the public assets (including the search index) and the rendered
//! pages the way the hosting layer would, built on `tiny_http`:
//!
//! - `public/` first, then the rendered pages
//! - `/about` resolves to `about.html` or `about/index.html`
//! - unknown paths get `_not-found.html` with status 404 when it exists
//! - graceful shutdown on Ctrl+C
//!
//! ```text
//! GET /blog/hello
//!   public/blog/hello              ✗
//!   public/blog/hello.html         ✗
//!   public/blog/hello/index.html   ✗
//!   pages/blog/hello               ✗
//!   pages/blog/hello.html          ✓
//! ```

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// Rendered 404 page, relative to the pages directory.
const NOT_FOUND_PAGE: &str = "_not-found.html";

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the preview server. Blocks until Ctrl+C is received.
pub fn serve_site(config: &SiteConfig) -> Result<()> {
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid [serve] interface `{}`", config.serve.interface))?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    let roots = [config.public_dir(), config.pages_dir()];
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &roots) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
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

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

fn handle_request(request: Request, roots: &[&Path]) -> Result<()> {
    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    match resolve(roots, &url_path) {
        Some(path) => serve_file(request, &path, StatusCode(200)),
        None => serve_not_found(request, roots),
    }
}

/// Map a request path onto a file under one of `roots`.
///
/// Query strings are ignored; paths that try to climb out of a root never
/// resolve.
fn resolve(roots: &[&Path], url_path: &str) -> Option<PathBuf> {
    let path = url_path.split(['?', '#']).next().unwrap_or_default();
    let relative = Path::new(path.trim_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    roots.iter().find_map(|root| candidates(root, relative).find(|p| p.is_file()))
}

/// `x`, `x.html`, `x/index.html`, in that order.
fn candidates(root: &Path, relative: &Path) -> impl Iterator<Item = PathBuf> {
    let exact = root.join(relative);
    let html = (!relative.as_os_str().is_empty()).then(|| {
        let mut name = exact.clone().into_os_string();
        name.push(".html");
        PathBuf::from(name)
    });
    let index = exact.join("index.html");
    std::iter::once(exact).chain(html).chain(std::iter::once(index))
}

// ============================================================================
// Response Helpers
// ============================================================================

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name, value).map_err(|()| anyhow!("Invalid header `{name}: {value}`"))
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path, status: StatusCode) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content)
        .with_status_code(status)
        .with_header(header("Content-Type", guess_content_type(path))?);

    request.respond(response)?;
    Ok(())
}

/// Serve the rendered 404 page, or a plain one.
fn serve_not_found(request: Request, roots: &[&Path]) -> Result<()> {
    if let Some(page) = roots
        .iter()
        .map(|root| root.join(NOT_FOUND_PAGE))
        .find(|page| page.is_file())
    {
        return serve_file(request, &page, StatusCode(404));
    }

    let response = Response::new(
        StatusCode(404),
        vec![header("Content-Type", "text/plain")?],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
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
        Some("txt") => "text/plain; charset=utf-8",
        Some("rsc") => "text/x-component",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
