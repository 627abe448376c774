//! `[search]` section configuration.

use super::defaults;
use crate::search::Mode;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[search]` section in folio.toml.
///
/// # Example
/// ```toml
/// [search]
/// dir = "_search"        # under [build] public
/// mode = "production"    # anything else disables queries
/// excerpt_words = 30
/// limit = 10
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Build the index during `folio build`.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Index directory, relative to `[build] public`.
    #[serde(default = "defaults::search::dir")]
    #[educe(Default = defaults::search::dir())]
    pub dir: PathBuf,

    #[serde(default = "defaults::search::mode")]
    #[educe(Default = defaults::search::mode())]
    pub mode: Mode,

    /// Words shown in each result excerpt.
    #[serde(default = "defaults::search::excerpt_words")]
    #[educe(Default = defaults::search::excerpt_words())]
    pub excerpt_words: usize,

    /// Maximum results per query (unlimited when unset).
    #[serde(default = "defaults::search::limit")]
    #[educe(Default = defaults::search::limit())]
    pub limit: Option<usize>,
}
