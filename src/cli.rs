//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use crate::search::Mode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// folio: search index, posts and previews for a static portfolio blog
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root
    #[arg(short = 'C', long, default_value = "folio.toml")]
    pub config: PathBuf,

    /// Rendered pages directory (relative to root)
    #[arg(long)]
    pub pages: Option<PathBuf>,

    /// Public asset directory (relative to root)
    #[arg(long)]
    pub public: Option<PathBuf>,

    /// Post content directory (relative to root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate the pages, then inline assets, build the search index, sitemap and robots
    Build {
        /// Assume the pages are already rendered; skip `[build] command`
        #[arg(long)]
        skip_generate: bool,
    },

    /// Rebuild only the search index from the rendered pages
    Index,

    /// List posts, newest first
    Posts {
        /// Show only the latest N posts
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a single post's metadata
    Post {
        /// File name of the post without extension
        slug: String,
    },

    /// Query the built search index
    Search {
        /// Query text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Environment gate: `production` enables search, anything else disables it
        #[arg(short, long)]
        mode: Option<Mode>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Preview the built site locally
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_joins_words() {
        let cli = Cli::parse_from(["folio", "search", "rust", "async"]);
        match cli.command {
            Commands::Search { query, mode, limit } => {
                assert_eq!(query.join(" "), "rust async");
                assert_eq!(mode, None);
                assert_eq!(limit, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_mode() {
        let cli = Cli::parse_from(["folio", "search", "-m", "development", "x"]);
        assert!(matches!(
            cli.command,
            Commands::Search { mode: Some(Mode::Development), .. }
        ));
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["folio", "search"]).is_err());
    }

    #[test]
    fn test_parse_global_paths() {
        let cli = Cli::parse_from(["folio", "--root", "site", "--pages", "out", "posts", "-l", "5"]);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.pages, Some(PathBuf::from("out")));
        assert_eq!(cli.config, PathBuf::from("folio.toml"));
        assert!(matches!(cli.command, Commands::Posts { limit: Some(5) }));
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::parse_from(["folio", "build", "--skip-generate"]);
        assert!(matches!(cli.command, Commands::Build { skip_generate: true }));
    }
}
