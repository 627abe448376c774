//! Page documents: rendered HTML files and their public URLs.
//!
//! ```text
//! pages/index.html           → /
//! pages/about.html           → /about
//! pages/blog/index.html      → /blog
//! pages/blog/hello.html      → /blog/hello
//! pages/_not-found.html      → (private, skipped)
//! pages/_next/static/x.html  → (private, skipped)
//! ```

use super::SearchError;
use crate::log;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use regex::{Captures, Regex};
use std::{
    fs,
    path::{Component, Path, PathBuf},
    sync::LazyLock,
};
use walkdir::{DirEntry, WalkDir};

const PAGE_EXTENSION: &str = "html";

/// One rendered route, read once and consumed by the index builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    pub url: String,
    pub html: String,
}

impl PageDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Read `path` (under `root`) as UTF-8 and derive its URL.
    pub fn read(root: &Path, path: &Path) -> Result<Self, SearchError> {
        let html = fs::read_to_string(path).map_err(|err| SearchError::Io(path.to_path_buf(), err))?;
        Ok(Self::new(page_url(root, path)?, html))
    }
}

/// All public `.html` files under `root`, sorted.
///
/// Any path segment starting with `private_prefix` hides the file, so both
/// `_not-found.html` and everything under `_next/` are left out.
pub fn collect_pages(root: &Path, private_prefix: &str) -> Vec<PathBuf> {
    let mut pages: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_private(entry.file_name(), private_prefix))
        .filter_map(skip_unreadable)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == PAGE_EXTENSION))
        .collect();
    pages.sort();
    pages
}

/// Unreadable entries are left out of the index with a warning.
fn skip_unreadable(entry: walkdir::Result<DirEntry>) -> Option<DirEntry> {
    match entry {
        Ok(entry) => Some(entry),
        Err(err) => {
            let path = err.path().map_or_else(String::new, |p| p.display().to_string());
            log!("warn"; "skipping unreadable page {path}: {err}");
            None
        }
    }
}

fn is_private(name: &std::ffi::OsStr, prefix: &str) -> bool {
    name.to_str().is_some_and(|name| name.starts_with(prefix))
}

/// Public URL of the page at `path`.
///
/// Strips `root`, the `.html` extension and a trailing `index` segment; an
/// empty result maps to `/`.
pub fn page_url(root: &Path, path: &Path) -> Result<String, SearchError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        SearchError::Io(
            path.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "page is outside the pages directory"),
        )
    })?;

    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = segments.last_mut()
        && let Some(stem) = last.strip_suffix(".html")
    {
        *last = stem.to_owned();
    }
    if segments.last().is_some_and(|last| last == "index") {
        segments.pop();
    }
    segments.retain(|segment| !segment.is_empty());

    Ok(format!("/{}", segments.join("/")))
}

// ============================================================================
// Text extraction
// ============================================================================

/// Searchable text of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// First `<h1>`, else `<title>`; empty when the page has neither.
    pub title: String,
    /// Visible text of the main content, whitespace collapsed.
    pub text: String,
}

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static NON_CONTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style|noscript|template)\b[^>]*>.*?</(script|style|noscript|template)\s*>").unwrap());
static IGNORED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<([a-z][a-z0-9-]*)\b[^>]*\bdata-search-ignore\b[^>]*>.*?</([a-z][a-z0-9-]*)\s*>"#).unwrap()
});
static MAIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*)</main\s*>").unwrap());
static BODY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").unwrap());
static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").unwrap());
static TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(p|div|br|hr|li|ul|ol|h[1-6]|section|article|header|footer|nav|aside|tr|td|th|table|pre|blockquote)\b[^>]*>").unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#?[A-Za-z0-9]+;").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Pull the title and visible text out of rendered HTML.
pub fn extract(html: &str) -> Extracted {
    let html = COMMENT.replace_all(html, "");
    let html = strip_paired(&NON_CONTENT, &html);
    let html = strip_paired(&IGNORED, &html);

    let title = H1
        .captures(&html)
        .or_else(|| TITLE.captures(&html))
        .map(|caps| to_text(&caps[1]))
        .unwrap_or_default();

    let content = MAIN
        .captures(&html)
        .or_else(|| BODY.captures(&html))
        .map_or(html.as_str(), |caps| caps.get(1).map_or("", |m| m.as_str()));

    Extracted {
        title,
        text: to_text(content),
    }
}

/// Remove `<tag …>…</tag>` spans whose opening and closing names agree.
///
/// The regex crate has no backreferences, so mismatched pairs are kept as-is.
fn strip_paired(pattern: &Regex, html: &str) -> String {
    pattern
        .replace_all(html, |caps: &Captures| {
            if caps[1].eq_ignore_ascii_case(&caps[2]) {
                String::new()
            } else {
                caps[0].to_owned()
            }
        })
        .into_owned()
}

/// Markup to plain text: tags dropped, entities decoded, whitespace collapsed.
fn to_text(markup: &str) -> String {
    let spaced = BLOCK_TAG.replace_all(markup, " ");
    let stripped = TAG.replace_all(&spaced, "");
    let decoded = decode_entities(&stripped);
    WHITESPACE.replace_all(&decoded, " ").trim().to_owned()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let raw = &caps[0];
            unescape_with(raw, |entity| resolve_predefined_entity(entity).or_else(|| html_entity(entity)))
                .map_or_else(|_| raw.to_owned(), |decoded| decoded.into_owned())
        })
        .into_owned()
}

/// HTML named entities common in rendered prose, beyond the XML five.
fn html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => " ",
        "ndash" => "–",
        "mdash" => "—",
        "hellip" => "…",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        "laquo" => "«",
        "raquo" => "»",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "middot" => "·",
        "bull" => "•",
        "times" => "×",
        "rarr" => "→",
        "larr" => "←",
        _ => return None,
    })
}
