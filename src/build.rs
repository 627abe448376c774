//! Build orchestration.
//!
//! Two phases with a hard ordering dependency: nothing in phase 2 may run
//! before the site generator has finished writing the pages.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── generate()            [build] command → pages/**/*.html
//!     │
//!     └── post_process()
//!             │
//!             ├── inline_pages()    <script> into every <head>
//!             ├── index_pages()     read → IndexBuilder → public/_search
//!             ├── build_sitemap()   pages + posts → sitemap.xml
//!             └── build_robots()    robots.txt
//! ```

use crate::{
    config::SiteConfig,
    generator::{build_robots, build_sitemap},
    inline::{InlinePolicy, inline_pages, load_scripts},
    log,
    posts::PostStore,
    search::{
        Artifact, IndexBuilder, Indexer, PageDocument, WriteReport,
        document::{collect_pages, page_url},
        write_artifact,
    },
    utils::{command::exec, log::ProgressBars},
};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::path::PathBuf;

/// What a build produced.
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Public URLs of every indexed page.
    pub urls: Vec<String>,
    /// `None` when search is disabled.
    pub index: Option<WriteReport>,
    pub sitemap: Option<PathBuf>,
    pub robots: Option<PathBuf>,
}

/// Run both phases.
pub fn build_site(config: &SiteConfig, skip_generate: bool) -> Result<BuildOutput> {
    if skip_generate {
        log!("build"; "skipping page generation");
    } else {
        generate(config)?;
    }
    post_process(config)
}

/// Phase 1: run the site generator, then require its output.
pub fn generate(config: &SiteConfig) -> Result<()> {
    let command = &config.build.command;
    if !command.is_empty() {
        log!("build"; "running `{}`", command.join(" "));
        exec(Some(config.root.as_path()), command).context("Site generator failed")?;
    }
    require_pages(config)
}

fn require_pages(config: &SiteConfig) -> Result<()> {
    let pages = config.pages_dir();
    if !pages.is_dir() {
        bail!(
            "Rendered pages not found at {}. Run the site generator first or set [build] pages.",
            pages.display()
        );
    }
    Ok(())
}

/// Phase 2: everything that consumes the rendered pages.
pub fn post_process(config: &SiteConfig) -> Result<BuildOutput> {
    require_pages(config)?;
    let pages = collect_pages(config.pages_dir(), &config.build.private_prefix);
    log!("build"; "found {} pages", pages.len());

    let inline = &config.build.inline;
    if !inline.scripts.is_empty() {
        let scripts = load_scripts(&inline.scripts, InlinePolicy::from_strict(inline.strict))?;
        let count = inline_pages(&pages, &scripts)?;
        log!("inline"; "{} scripts into {} pages", scripts.len(), count);
    }

    let index = if config.search.enable {
        Some(index_pages(config, &pages)?)
    } else {
        None
    };

    let urls = pages
        .iter()
        .map(|page| page_url(config.pages_dir(), page))
        .collect::<Result<Vec<_>, _>>()?;

    let posts = PostStore::new(&config.content.dir, config.content.extension.as_str())
        .list(None)
        .context("Failed to load posts for the sitemap")?;
    let sitemap = build_sitemap(config, &urls, &posts)?;
    let robots = build_robots(config)?;

    if let Some(report) = &index {
        report_index_errors(report)?;
    }

    Ok(BuildOutput {
        urls,
        index,
        sitemap,
        robots,
    })
}

/// Rebuild the search index from the rendered pages only.
///
/// Unlike a full build, any file that could not be written fails the command.
pub fn index_site(config: &SiteConfig) -> Result<Vec<PathBuf>> {
    require_pages(config)?;
    let pages = collect_pages(config.pages_dir(), &config.build.private_prefix);
    index_pages(config, &pages)?.into_result()
}

/// Read, accumulate and write the index for `pages`.
///
/// Reading is parallel; accumulation runs on one thread in page order so the
/// artifact stays deterministic.
fn index_pages(config: &SiteConfig, pages: &[PathBuf]) -> Result<WriteReport> {
    let root = config.pages_dir();
    let progress = ProgressBars::new(&[("read", pages.len()), ("index", pages.len())]);

    let docs = pages
        .par_iter()
        .map(|page| {
            let doc = PageDocument::read(root, page);
            progress.inc_by_name("read");
            doc
        })
        .collect::<Result<Vec<_>, _>>();

    let artifact = docs.and_then(|docs| {
        IndexBuilder::new().build(docs.into_iter().inspect(|_| progress.inc_by_name("index")))
    });
    progress.finish();
    let artifact = artifact?;

    log!("search"; "indexed {} pages into {} files", pages.len(), artifact.len());
    Ok(write_index(config, &artifact))
}

fn write_index(config: &SiteConfig, artifact: &Artifact) -> WriteReport {
    let dir = config.search_dir();
    let report = write_artifact(artifact, &dir);
    log!("search"; "{} -> {} (served at {})", report.written.len(), dir.display(), config.search_url());
    report
}

/// Partial write failures only warn; an index with no files at all fails.
fn report_index_errors(report: &WriteReport) -> Result<()> {
    if report.is_complete() {
        return Ok(());
    }
    if report.written.is_empty() {
        bail!("No search index file could be written ({} failures)", report.errors.len());
    }
    log!("warn"; "{} search index files could not be written", report.errors.len());
    for (path, err) in &report.errors {
        log!("warn"; "  {}: {err}", path.display());
    }
    Ok(())
}
