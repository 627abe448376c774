//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [base]
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }
}

// ============================================================================
// [build]
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    /// Where the site generator leaves one `.html` file per route.
    pub fn pages() -> PathBuf {
        ".next/server/app".into()
    }

    /// Directory served verbatim by the hosting layer.
    pub fn public() -> PathBuf {
        "public".into()
    }

    pub fn private_prefix() -> String {
        "_".into()
    }

    pub mod sitemap {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "sitemap.xml".into()
        }
    }

    pub mod robots {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "robots.txt".into()
        }
    }
}

// ============================================================================
// [content]
// ============================================================================

pub mod content {
    use std::path::PathBuf;

    pub fn dir() -> PathBuf {
        "src/app/blog/posts".into()
    }

    pub fn extension() -> String {
        "mdx".into()
    }

    pub fn route() -> String {
        "/blog".into()
    }
}

// ============================================================================
// [search]
// ============================================================================

pub mod search {
    use crate::search::Mode;
    use std::path::PathBuf;

    pub fn dir() -> PathBuf {
        "_search".into()
    }

    pub fn mode() -> Mode {
        Mode::Production
    }

    pub fn excerpt_words() -> usize {
        30
    }

    pub fn limit() -> Option<usize> {
        None
    }
}

// ============================================================================
// [serve]
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5277
    }
}
