//! Full-text search over the rendered site.
//!
//! Two decoupled halves share the on-disk format:
//!
//! ```text
//! build time                                  query time
//! ──────────                                  ──────────
//! pages/**/*.html                             Search::query("rust asy")
//!   → document::collect_pages                   → entry.json (once)
//!   → IndexBuilder::add(PageDocument)           → index/<shard>.json (cached)
//!   → IndexBuilder::finish → Artifact           → BM25 → ResultSet
//!   → writer::write_artifact(public/_search)    → Hit::data → fragment/<id>.json
//! ```
//!
//! The artifact is a pure function of the page set and is replaced wholesale
//! on every build.

pub mod client;
pub mod document;
pub mod excerpt;
pub mod index;
pub mod session;
pub mod writer;

pub use client::{AssetSource, DirSource, Search, SearchResult};
pub use document::PageDocument;
pub use index::{Artifact, IndexBuilder, Indexer};
pub use session::{SearchSession, View};
pub use writer::{WriteReport, write_artifact};

use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, io, path::PathBuf, str::FromStr};
use thiserror::Error;

/// Shown in place of results when queries are disabled.
pub const UNAVAILABLE_MESSAGE: &str = "Search is only available in production builds. \
    Try building and previewing the site to test it out locally.";

#[derive(Debug, Error)]
pub enum SearchError {
    /// Queries are disabled outside production mode.
    #[error("{UNAVAILABLE_MESSAGE}")]
    Unavailable,

    #[error("page `{0}` was added to the index twice")]
    DuplicateUrl(String),

    #[error("failed to read `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("failed to fetch index asset `{0}`")]
    Fetch(String, #[source] io::Error),

    #[error("malformed index asset `{0}`")]
    Decode(String, #[source] serde_json::Error),

    #[error("failed to encode index asset `{0}`")]
    Encode(String, #[source] serde_json::Error),

    #[error("unsupported index version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("index refers to unknown page #{0}")]
    UnknownPage(u32),
}

/// Environment gate for the query client.
///
/// Only `production` enables queries; every other value disables them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    Production,
    #[default]
    Development,
}

impl Mode {
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Mode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        })
    }
}

impl From<String> for Mode {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(mode) => mode,
            Err(never) => match never {},
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Production => "production",
            Self::Development => "development",
        })
    }
}
