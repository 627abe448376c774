//! Inline inclusion of static scripts into rendered pages.
//!
//! Scripts that must run before first paint (theme setup and the like) are
//! copied into every page's `<head>` instead of being referenced by URL.

use crate::log;
use anyhow::{Context, Result};
use quick_xml::escape::escape;
use rayon::prelude::*;
use regex::Regex;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use thiserror::Error;

static HEAD_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</head\s*>").unwrap());
static SCRIPT_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</script").unwrap());
static INLINED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<script data-folio-inline="[^"]*">.*?</script>"#).unwrap());

#[derive(Debug, Error)]
pub enum InlineError {
    #[error("Could not find '{}'", .0.display())]
    Missing(PathBuf),

    #[error("failed to read `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),
}

/// What to do when a script to inline does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlinePolicy {
    /// Fail the build.
    Strict,
    /// Log and leave the script out.
    Lenient,
}

impl InlinePolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }
}

/// A script read from disk, ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub path: PathBuf,
    pub source: String,
}

impl Script {
    /// File name recorded on the tag, so a rebuild can find it again.
    fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.to_string_lossy(), |name| name.to_string_lossy())
            .into_owned()
    }

    fn to_tag(&self) -> String {
        // A literal `</script` would end the element early
        let source = SCRIPT_END.replace_all(&self.source, r"<\/script");
        format!(r#"<script data-folio-inline="{}">{source}</script>"#, escape(self.name()))
    }
}

/// Read every script, applying `policy` to missing files.
pub fn load_scripts(paths: &[PathBuf], policy: InlinePolicy) -> Result<Vec<Script>, InlineError> {
    let mut scripts = Vec::with_capacity(paths.len());
    for path in paths {
        match fs::read_to_string(path) {
            Ok(source) => scripts.push(Script {
                path: path.clone(),
                source,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => match policy {
                InlinePolicy::Strict => return Err(InlineError::Missing(path.clone())),
                InlinePolicy::Lenient => {
                    log!("warn"; "Could not find '{}', skipping", path.display());
                }
            },
            Err(err) => return Err(InlineError::Io(path.clone(), err)),
        }
    }
    Ok(scripts)
}

/// Insert `scripts` right before `</head>`, or at the very start of a
/// document without a head.
///
/// Scripts inlined by an earlier run are replaced, so a page rewritten twice
/// still carries each script once.
pub fn inline_scripts(html: &str, scripts: &[Script]) -> String {
    let html = INLINED.replace_all(html, "");
    let tags: String = scripts.iter().map(Script::to_tag).collect();
    let at = HEAD_END.find(&html).map_or(0, |m| m.start());

    let mut out = String::with_capacity(html.len() + tags.len());
    out.push_str(&html[..at]);
    out.push_str(&tags);
    out.push_str(&html[at..]);
    out
}

/// Rewrite every page in place with `scripts` inlined. Returns the number of
/// pages rewritten.
pub fn inline_pages(pages: &[PathBuf], scripts: &[Script]) -> Result<usize> {
    if scripts.is_empty() {
        return Ok(0);
    }
    pages.par_iter().try_for_each(|page| inline_page(page, scripts))?;
    Ok(pages.len())
}

fn inline_page(page: &Path, scripts: &[Script]) -> Result<()> {
    let html = fs::read_to_string(page).with_context(|| format!("Failed to read {}", page.display()))?;
    fs::write(page, inline_scripts(&html, scripts))
        .with_context(|| format!("Failed to write {}", page.display()))
}
