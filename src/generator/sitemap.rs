//! Sitemap generation.
//!
//! Lists every indexed page and every blog post for search engines.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/blog/hello</loc>
//!     <lastmod>2024-06-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{config::SiteConfig, log, posts::PostMeta, utils::date::format_ymd};
use anyhow::{Context, Result};
use quick_xml::escape::escape;
use std::{collections::BTreeMap, fs, path::PathBuf};

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Build `sitemap.xml` if enabled in config. Returns the written path.
pub fn build_sitemap(config: &SiteConfig, pages: &[String], posts: &[PostMeta]) -> Result<Option<PathBuf>> {
    if !config.build.sitemap.enable {
        return Ok(None);
    }
    let base = config.base.url_trimmed().context("[base.url] is required for the sitemap")?;

    let post_urls = posts
        .iter()
        .map(|post| (config.content.post_url(&post.slug), format_ymd(&post.published_at)));
    let sitemap = Sitemap::new(base, pages, post_urls);

    let path = config.sitemap_path();
    sitemap.write(&path)?;
    Ok(Some(path))
}

/// Sitemap data structure, entries sorted by location.
struct Sitemap {
    urls: Vec<UrlEntry>,
}

/// Single URL entry in the sitemap
struct UrlEntry {
    /// Full URL location
    loc: String,
    /// Last modification date (YYYY-MM-DD)
    lastmod: Option<String>,
}

impl Sitemap {
    /// Merge page paths and `(path, lastmod)` post entries under `base`.
    ///
    /// A post that is also a rendered page appears once, with its date.
    fn new(base: &str, pages: &[String], posts: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut entries: BTreeMap<String, Option<String>> =
            pages.iter().map(|page| (page.clone(), None)).collect();
        for (path, lastmod) in posts {
            entries.insert(path, Some(lastmod));
        }

        let urls = entries
            .into_iter()
            .map(|(path, lastmod)| UrlEntry {
                loc: format!("{base}{path}"),
                lastmod,
            })
            .collect();
        Self { urls }
    }

    /// Generate sitemap XML string.
    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(256 + self.urls.len() * 96);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape(entry.loc.as_str())));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    fn write(self, path: &std::path::Path) -> Result<()> {
        let count = self.urls.len();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.into_xml())
            .with_context(|| format!("Failed to write sitemap to {}", path.display()))?;

        log!("sitemap"; "{} urls -> {}", count, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clap::Parser;

    const BASE: &str = "https://example.com";

    fn pages(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    fn post(slug: &str, y: i32, m: u32, d: u32) -> PostMeta {
        PostMeta {
            slug: slug.into(),
            title: slug.into(),
            description: String::new(),
            published_at: Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_sitemap_empty() {
        let xml = Sitemap::new(BASE, &[], []).into_xml();

        assert!(xml.contains(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.contains("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_sitemap_pages_and_posts() {
        let xml = Sitemap::new(
            BASE,
            &pages(&["/", "/about", "/blog"]),
            [("/blog/hello".to_string(), "2024-06-01".to_string())],
        )
        .into_xml();

        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/about</loc>"));
        assert!(xml.contains("<loc>https://example.com/blog/hello</loc>\n    <lastmod>2024-06-01</lastmod>"));
        assert_eq!(xml.matches("<url>").count(), 4);
        assert_eq!(xml.matches("<lastmod>").count(), 1);
    }

    #[test]
    fn test_sitemap_deduplicates_and_sorts() {
        let xml = Sitemap::new(
            BASE,
            &pages(&["/projects", "/blog/hello", "/"]),
            [("/blog/hello".to_string(), "2024-06-01".to_string())],
        )
        .into_xml();

        assert_eq!(xml.matches("/blog/hello</loc>").count(), 1);
        assert!(xml.contains("<lastmod>2024-06-01</lastmod>"));

        let locs: Vec<&str> = xml
            .lines()
            .filter_map(|line| line.trim().strip_prefix("<loc>"))
            .collect();
        let mut sorted = locs.clone();
        sorted.sort();
        assert_eq!(locs, sorted);
    }

    #[test]
    fn test_sitemap_escapes_special_chars() {
        let xml = Sitemap::new(BASE, &pages(&["/search?q=a&b=c"]), []).into_xml();
        assert!(xml.contains("<loc>https://example.com/search?q=a&amp;b=c</loc>"));
    }

    #[test]
    fn test_sitemap_xml_structure() {
        let xml = Sitemap::new(BASE, &pages(&["/"]), []).into_xml();

        let lines: Vec<&str> = xml.lines().collect();
        assert_eq!(lines[0], r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        assert!(lines[1].starts_with("<urlset"));
        assert_eq!(lines.last().unwrap().trim(), "</urlset>");
    }

    #[test]
    fn test_build_sitemap_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = crate::cli::Cli::parse_from(["folio", "--root", root, "index"]);

        let mut config = SiteConfig::from_str("[base]\nurl = \"https://example.com/\"").unwrap();
        config.update_with_cli(&cli, None);
        fs::create_dir_all(config.public_dir()).unwrap();

        let path = build_sitemap(&config, &pages(&["/"]), &[post("hello", 2024, 6, 1)])
            .unwrap()
            .unwrap();
        let xml = fs::read_to_string(path).unwrap();
        assert!(xml.contains("<loc>https://example.com/blog/hello</loc>"));
        assert!(xml.contains("<lastmod>2024-06-01</lastmod>"));
    }

    #[test]
    fn test_build_sitemap_disabled() {
        let config = SiteConfig::from_str("[build.sitemap]\nenable = false").unwrap();
        assert_eq!(build_sitemap(&config, &[], &[]).unwrap(), None);
    }
}
