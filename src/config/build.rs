//! `[build]` section configuration.
//!
//! Paths of the two build phases plus the post-processing steps.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in folio.toml.
///
/// # Example
/// ```toml
/// [build]
/// command = ["npx", "next", "build"]  # renders every route to HTML
/// pages = ".next/server/app"          # where the rendered pages land
/// public = "public"                   # statically served directory
///
/// [build.inline]
/// scripts = ["src/assets/theme.js"]
/// strict = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Page generation command, run in the project root. Empty skips it.
    pub command: Vec<String>,

    /// Rendered HTML pages (input of indexing).
    #[serde(default = "defaults::build::pages")]
    #[educe(Default = defaults::build::pages())]
    pub pages: PathBuf,

    /// Public asset directory (search index, sitemap, robots).
    #[serde(default = "defaults::build::public")]
    #[educe(Default = defaults::build::public())]
    pub public: PathBuf,

    /// Path segments starting with this prefix are private and never indexed.
    #[serde(default = "defaults::build::private_prefix")]
    #[educe(Default = defaults::build::private_prefix())]
    pub private_prefix: String,

    pub inline: InlineConfig,

    pub sitemap: SitemapConfig,

    pub robots: RobotsConfig,
}

/// `[build.inline]` - scripts copied verbatim into every page's `<head>`.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct InlineConfig {
    pub scripts: Vec<PathBuf>,

    /// A missing script aborts the build when set, otherwise it is skipped.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub strict: bool,
}

/// `[build.sitemap]`
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Relative to `[build] public`.
    #[serde(default = "defaults::build::sitemap::path")]
    #[educe(Default = defaults::build::sitemap::path())]
    pub path: PathBuf,
}

/// `[build.robots]`
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct RobotsConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Relative to `[build] public`.
    #[serde(default = "defaults::build::robots::path")]
    #[educe(Default = defaults::build::robots::path())]
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert!(config.build.command.is_empty());
        assert_eq!(config.build.pages, PathBuf::from(".next/server/app"));
        assert_eq!(config.build.public, PathBuf::from("public"));
        assert_eq!(config.build.private_prefix, "_");
        assert!(config.build.inline.scripts.is_empty());
        assert!(config.build.inline.strict);
        assert!(config.build.sitemap.enable);
        assert_eq!(config.build.sitemap.path, PathBuf::from("sitemap.xml"));
        assert!(config.build.robots.enable);
        assert_eq!(config.build.robots.path, PathBuf::from("robots.txt"));
    }

    #[test]
    fn test_build_config_custom() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build]
            command = ["npx", "next", "build"]
            pages = "out"

            [build.inline]
            scripts = ["src/assets/theme.js"]
            strict = false

            [build.sitemap]
            enable = false
        "#,
        )
        .unwrap();

        assert_eq!(config.build.command, vec!["npx", "next", "build"]);
        assert_eq!(config.build.pages, PathBuf::from("out"));
        assert_eq!(
            config.build.inline.scripts,
            vec![PathBuf::from("src/assets/theme.js")]
        );
        assert!(!config.build.inline.strict);
        assert!(!config.build.sitemap.enable);
        // Untouched sibling keeps its default
        assert!(config.build.robots.enable);
    }

    #[test]
    fn test_build_config_rejects_unknown_field() {
        let result: Result<SiteConfig, _> = toml::from_str("[build]\nminify = true");
        assert!(result.is_err());
    }
}
