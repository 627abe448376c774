//! `[base]` section configuration.
//!
//! The public site URL, used to build absolute links in the sitemap and
//! robots file.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in folio.toml.
///
/// # Example
/// ```toml
/// [base]
/// url = "https://jane.example"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Absolute site URL without trailing slash.
    /// Required when the sitemap or robots file is generated.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,
}

impl BaseConfig {
    /// Site URL with any trailing slash removed.
    pub fn url_trimmed(&self) -> Option<&str> {
        self.url.as_deref().map(|u| u.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_config_url() {
        let config: SiteConfig = toml::from_str("[base]\nurl = \"https://sina.example\"").unwrap();
        assert_eq!(config.base.url.as_deref(), Some("https://sina.example"));
    }

    #[test]
    fn test_base_config_defaults() {
        let config: SiteConfig = toml::from_str("[base]").unwrap();
        assert_eq!(config.base.url, None);
    }

    #[test]
    fn test_base_config_rejects_unknown_keys() {
        assert!(toml::from_str::<SiteConfig>("[base]\nauthor = \"Sina\"").is_err());
    }

    #[test]
    fn test_url_trimmed() {
        let config: SiteConfig =
            toml::from_str("[base]\nurl = \"https://sina.example/\"").unwrap();
        assert_eq!(config.base.url_trimmed(), Some("https://sina.example"));
    }
}
