//! `robots.txt` generation.
//!
//! ```text
//! User-Agent: *
//! Allow: /
//!
//! Sitemap: https://example.com/sitemap.xml
//! ```

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

/// Build `robots.txt` if enabled in config. Returns the written path.
pub fn build_robots(config: &SiteConfig) -> Result<Option<PathBuf>> {
    if !config.build.robots.enable {
        return Ok(None);
    }
    let base = config.base.url_trimmed().context("[base.url] is required for robots.txt")?;
    let sitemap = format!("{base}/{}", config.build.sitemap.path.to_string_lossy().replace('\\', "/"));

    let path = config.robots_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, render(&sitemap)).with_context(|| format!("Failed to write {}", path.display()))?;

    log!("robots"; "{}", path.display());
    Ok(Some(path))
}

/// Allow every crawler everywhere and point at the sitemap.
fn render(sitemap_url: &str) -> String {
    format!("User-Agent: *\nAllow: /\n\nSitemap: {sitemap_url}\n")
}
