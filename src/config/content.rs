//! `[content]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[content]` section in folio.toml - blog post sources.
///
/// # Example
/// ```toml
/// [content]
/// dir = "src/app/blog/posts"
/// extension = "mdx"
/// route = "/blog"          # posts are published at /blog/<slug>
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    #[serde(default = "defaults::content::dir")]
    #[educe(Default = defaults::content::dir())]
    pub dir: PathBuf,

    /// Post file extension, without the dot.
    #[serde(default = "defaults::content::extension")]
    #[educe(Default = defaults::content::extension())]
    pub extension: String,

    /// URL path posts are published under.
    #[serde(default = "defaults::content::route")]
    #[educe(Default = defaults::content::route())]
    pub route: String,
}

impl ContentConfig {
    /// Public URL path of a post: `/blog/<slug>`.
    pub fn post_url(&self, slug: &str) -> String {
        let route = self.route.trim_end_matches('/');
        format!("{route}/{slug}")
    }
}
