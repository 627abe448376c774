//! Site configuration management for `folio.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[base]`    | Public site URL                                  |
//! | `[build]`   | Generator command, pages/public paths, inlining  |
//! | `[content]` | Blog post sources                                |
//! | `[search]`  | Index location, environment gate, excerpts       |
//! | `[serve]`   | Local preview server                             |
//!
//! # Example
//!
//! ```toml
//! [base]
//! url = "https://example.com"
//!
//! [build]
//! command = ["npx", "next", "build"]
//!
//! [content]
//! dir = "src/app/blog/posts"
//!
//! [search]
//! excerpt_words = 24
//! ```

mod base;
mod build;
mod content;
pub mod defaults;
mod error;
mod search;
mod serve;

pub use error::ConfigError;

use base::BaseConfig;
use build::BuildConfig;
use content::ContentConfig;
use search::SearchConfig;
use serve::ServeConfig;

use crate::{
    cli::{Cli, Commands},
    search::Mode,
    utils::command::check_installed,
};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Environment variable consulted for the search mode when `--mode` is absent.
pub const MODE_ENV: &str = "FOLIO_ENV";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing folio.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub base: BaseConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `folio.toml` for the given CLI invocation.
    ///
    /// A missing config file yields the defaults, so a conventional Next.js
    /// layout works without any configuration.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.config_path = config_path;
        config.update_with_cli(cli, std::env::var(MODE_ENV).ok().as_deref());
        config.validate(cli)?;
        Ok(config)
    }

    /// Directory holding the rendered pages.
    pub fn pages_dir(&self) -> &Path {
        &self.build.pages
    }

    /// Directory served verbatim by the hosting layer.
    pub fn public_dir(&self) -> &Path {
        &self.build.public
    }

    /// Directory the search index is written to.
    pub fn search_dir(&self) -> PathBuf {
        self.build.public.join(&self.search.dir)
    }

    /// URL path the search index is served under, e.g. `/_search`.
    pub fn search_url(&self) -> String {
        format!("/{}", self.search.dir.to_string_lossy().replace('\\', "/"))
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.build.public.join(&self.build.sitemap.path)
    }

    pub fn robots_path(&self) -> PathBuf {
        self.build.public.join(&self.build.robots.path)
    }

    /// Apply CLI overrides, then resolve every path against the root.
    ///
    /// `env_mode` is the value of [`MODE_ENV`], used when `--mode` is absent.
    pub fn update_with_cli(&mut self, cli: &Cli, env_mode: Option<&str>) {
        Self::update_option(&mut self.build.pages, cli.pages.as_ref());
        Self::update_option(&mut self.build.public, cli.public.as_ref());
        Self::update_option(&mut self.content.dir, cli.content.as_ref());

        let env_mode = env_mode.map(|m| m.parse::<Mode>().unwrap_or_default());
        match &cli.command {
            Commands::Search { mode, limit, .. } => {
                Self::update_option(&mut self.search.mode, mode.as_ref().or(env_mode.as_ref()));
                if limit.is_some() {
                    self.search.limit = *limit;
                }
            }
            Commands::Serve { interface, port } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            _ => Self::update_option(&mut self.search.mode, env_mode.as_ref()),
        }

        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        self.update_path_with_root(root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all paths relative to `root` and normalize them to absolute.
    fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);

        self.config_path = Self::resolve(&root, &self.config_path);
        self.build.pages = Self::resolve(&root, &self.build.pages);
        self.build.public = Self::resolve(&root, &self.build.public);
        self.content.dir = Self::resolve(&root, &self.content.dir);
        self.build.inline.scripts = self
            .build
            .inline
            .scripts
            .iter()
            .map(|script| Self::resolve(&root, script))
            .collect();

        self.root = root;
    }

    /// Expand `~` and join relative paths onto `root`.
    fn resolve(root: &Path, path: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
        if expanded.is_absolute() {
            Self::normalize_path(&expanded)
        } else {
            Self::normalize_path(&root.join(expanded))
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self, cli: &Cli) -> Result<()> {
        if let Some(url) = &self.base.url
            && !url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.search.excerpt_words == 0 {
            bail!(ConfigError::Validation(
                "[search.excerpt_words] must be greater than 0".into()
            ));
        }

        // The index directory is deleted on every build
        if !is_nested(&self.search.dir) {
            bail!(ConfigError::Validation(
                "[search.dir] must be a relative path inside the public directory".into()
            ));
        }

        if self.build.private_prefix.is_empty() {
            bail!(ConfigError::Validation(
                "[build.private_prefix] must not be empty".into()
            ));
        }

        if let Commands::Build { skip_generate } = &cli.command {
            let needs_url = self.build.sitemap.enable || self.build.robots.enable;
            if needs_url && self.base.url.is_none() {
                bail!(ConfigError::Validation(
                    "[base.url] is required for sitemap/robots generation".into()
                ));
            }
            if !skip_generate && !self.build.command.is_empty() {
                check_installed("[build.command]", &self.build.command)?;
            }
        }

        Ok(())
    }
}

/// Non-empty, relative and free of `.`/`..` components.
fn is_nested(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("folio").chain(args.iter().copied()))
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = SiteConfig::from_str("").unwrap();
        assert_eq!(config.build.public, PathBuf::from("public"));
        assert_eq!(config.search.mode, Mode::Production);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(SiteConfig::from_str("[deploy]\nforce = true").is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SiteConfig::from_path(Path::new("/definitely/not/here/folio.toml")).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = cli(&["--root", root, "posts"]);

        let mut config = SiteConfig::default();
        config.config_path = PathBuf::from("folio.toml");
        config.update_with_cli(&cli, None);

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.root, root);
        assert_eq!(config.build.public, root.join("public"));
        assert_eq!(config.search_dir(), root.join("public").join("_search"));
        assert_eq!(config.content.dir, root.join("src/app/blog/posts"));
    }

    #[test]
    fn test_cli_overrides_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = cli(&["--root", root, "--pages", "out", "--content", "posts", "index"]);

        let mut config = SiteConfig::default();
        config.update_with_cli(&cli, None);

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.build.pages, root.join("out"));
        assert_eq!(config.content.dir, root.join("posts"));
    }

    #[test]
    fn test_search_mode_precedence() {
        // --mode beats the environment
        let mut config = SiteConfig::default();
        config.update_with_cli(&cli(&["search", "--mode", "production", "rust"]), Some("development"));
        assert_eq!(config.search.mode, Mode::Production);

        // Environment beats the file
        let mut config = SiteConfig::default();
        config.update_with_cli(&cli(&["search", "rust"]), Some("development"));
        assert_eq!(config.search.mode, Mode::Development);

        // Any non-production value disables search
        let mut config = SiteConfig::default();
        config.update_with_cli(&cli(&["search", "rust"]), Some("staging"));
        assert_eq!(config.search.mode, Mode::Development);
    }

    #[test]
    fn test_serve_overrides() {
        let mut config = SiteConfig::default();
        config.update_with_cli(&cli(&["serve", "--port", "8080"]), None);
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.interface, "127.0.0.1");
    }

    #[test]
    fn test_validate_requires_url_for_build() {
        let config = SiteConfig::default();
        let err = config.validate(&cli(&["build", "--skip-generate"])).unwrap_err();
        assert!(err.to_string().contains("[base.url]"));

        // Other commands do not need it
        assert!(config.validate(&cli(&["index"])).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = SiteConfig::from_str("[base]\nurl = \"example.com\"").unwrap();
        assert!(config.validate(&cli(&["index"])).is_err());
    }

    #[test]
    fn test_validate_build_without_sitemap() {
        let config = SiteConfig::from_str(
            r#"
            [build.sitemap]
            enable = false
            [build.robots]
            enable = false
        "#,
        )
        .unwrap();
        assert!(config.validate(&cli(&["build"])).is_ok());
    }

    #[test]
    fn test_validate_search_dir() {
        for dir in ["", ".", "..", "../public", "_search/../..", "/tmp/_search"] {
            let config = SiteConfig::from_str(&format!("[search]\ndir = {dir:?}")).unwrap();
            let err = config.validate(&cli(&["index"])).unwrap_err();
            assert!(err.to_string().contains("[search.dir]"), "{dir:?}");
        }

        let config = SiteConfig::from_str("[search]\ndir = \"assets/_search\"").unwrap();
        assert!(config.validate(&cli(&["index"])).is_ok());
    }

    #[test]
    fn test_search_url() {
        let config = SiteConfig::default();
        assert_eq!(config.search_url(), "/_search");
    }
}
