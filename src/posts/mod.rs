//! Blog post metadata loading.
//!
//! Every post is one file in the content directory; its file stem is the
//! slug. Metadata is read from the front-matter on every call, there is no
//! cache to invalidate.
//!
//! ```text
//! posts/
//! ├── a.mdx   publishedAt: 2024-01-01
//! └── b.mdx   publishedAt: 2024-06-01
//!
//! store.list(Some(1))  → [b]
//! store.get("missing") → Err(PostError::NotFound)
//! ```

pub mod frontmatter;

use crate::utils::date::{DateError, parse_timestamp};
use chrono::{DateTime, Utc};
use frontmatter::FrontMatterError;
use rayon::prelude::*;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostError {
    /// No content file exists for the slug. Callers turn this into a 404.
    #[error("post not found: {0}")]
    NotFound(String),

    #[error("failed to read `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("invalid front-matter in `{}`", .0.display())]
    FrontMatter(PathBuf, #[source] FrontMatterError),

    #[error("invalid metadata in `{}`", .0.display())]
    Metadata(PathBuf, #[source] serde_json::Error),

    #[error("invalid publication date in `{}`", .0.display())]
    Date(PathBuf, #[source] DateError),
}

/// Metadata of one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMeta {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
}

/// A post with its unrendered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub meta: PostMeta,
    pub body: String,
}

/// Front-matter fields as written by authors.
#[derive(Deserialize)]
struct RawMeta {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "publishedAt", alias = "published_at")]
    published_at: String,
}

/// Read-only view over the content directory.
#[derive(Debug, Clone)]
pub struct PostStore {
    dir: PathBuf,
    extension: String,
}

impl PostStore {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Load one post by slug.
    ///
    /// Returns [`PostError::NotFound`] when there is no such file, including
    /// slugs that try to leave the content directory.
    pub fn get(&self, slug: &str) -> Result<Post, PostError> {
        let path = self
            .path_for(slug)
            .filter(|path| path.is_file())
            .ok_or_else(|| PostError::NotFound(slug.to_owned()))?;
        load(&path, slug)
    }

    /// All posts, newest first, optionally cut to the latest `limit`.
    ///
    /// Posts published at the same instant are ordered by slug. A missing
    /// content directory means there are no posts yet.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<PostMeta>, PostError> {
        let files = self.files()?;

        let mut posts = files
            .par_iter()
            .map(|(slug, path)| load(path, slug).map(|post| post.meta))
            .collect::<Result<Vec<_>, _>>()?;

        posts.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });

        if let Some(limit) = limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    /// `(slug, path)` of every content file.
    fn files(&self) -> Result<Vec<(String, PathBuf)>, PostError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(PostError::Io(self.dir.clone(), err)),
        };

        let files = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == self.extension.as_str()))
            .filter_map(|path| {
                let slug = path.file_stem()?.to_str()?.to_owned();
                Some((slug, path))
            })
            .collect();
        Ok(files)
    }

    fn path_for(&self, slug: &str) -> Option<PathBuf> {
        let is_plain = !slug.is_empty()
            && !slug.starts_with('.')
            && !slug.contains(['/', '\\'])
            && !slug.contains("..");
        is_plain.then(|| self.dir.join(format!("{slug}.{}", self.extension)))
    }
}

/// Read and parse one content file.
fn load(path: &Path, slug: &str) -> Result<Post, PostError> {
    let text = fs::read_to_string(path).map_err(|err| PostError::Io(path.to_path_buf(), err))?;
    let parsed =
        frontmatter::parse(&text).map_err(|err| PostError::FrontMatter(path.to_path_buf(), err))?;
    let raw: RawMeta = parsed
        .attributes
        .deserialize()
        .map_err(|err| PostError::Metadata(path.to_path_buf(), err))?;
    let published_at =
        parse_timestamp(&raw.published_at).map_err(|err| PostError::Date(path.to_path_buf(), err))?;

    Ok(Post {
        meta: PostMeta {
            slug: slug.to_owned(),
            title: raw.title,
            description: raw.description,
            published_at,
        },
        body: parsed.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_post(dir: &Path, slug: &str, date: &str) {
        let text = format!(
            "---\ntitle: Post {slug}\ndescription: About {slug}\npublishedAt: {date}\n---\nBody of {slug}\n"
        );
        fs::write(dir.join(format!("{slug}.mdx")), text).unwrap();
    }

    fn store_with(posts: &[(&str, &str)]) -> (TempDir, PostStore) {
        let dir = TempDir::new().unwrap();
        for (slug, date) in posts {
            write_post(dir.path(), slug, date);
        }
        let store = PostStore::new(dir.path(), "mdx");
        (dir, store)
    }

    fn slugs(posts: &[PostMeta]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_latest_one_post() {
        let (_dir, store) = store_with(&[("a", "2024-01-01"), ("b", "2024-06-01")]);
        let posts = store.list(Some(1)).unwrap();
        assert_eq!(slugs(&posts), ["b"]);
    }

    #[test]
    fn test_list_sorted_newest_first() {
        let (_dir, store) = store_with(&[
            ("old", "2022-03-01"),
            ("new", "2024-03-01"),
            ("mid", "2023-03-01T10:00:00Z"),
        ]);
        let posts = store.list(None).unwrap();
        assert_eq!(slugs(&posts), ["new", "mid", "old"]);
        assert!(posts.windows(2).all(|w| w[0].published_at > w[1].published_at));
    }

    #[test]
    fn test_truncation_keeps_newest() {
        let dates = [
            ("p1", "2024-01-01"),
            ("p2", "2024-02-01"),
            ("p3", "2024-03-01"),
            ("p4", "2024-04-01"),
            ("p5", "2024-05-01"),
        ];
        let (_dir, store) = store_with(&dates);
        let all = store.list(None).unwrap();
        let latest = store.list(Some(3)).unwrap();

        assert_eq!(latest.len(), 3);
        let oldest_kept = latest.iter().map(|p| p.published_at).min().unwrap();
        for excluded in &all[3..] {
            assert!(oldest_kept >= excluded.published_at);
        }
    }

    #[test]
    fn test_limit_larger_than_set() {
        let (_dir, store) = store_with(&[("a", "2024-01-01")]);
        assert_eq!(store.list(Some(10)).unwrap().len(), 1);
        assert!(store.list(Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_ties_ordered_by_slug() {
        let (_dir, store) = store_with(&[("zeta", "2024-01-01"), ("alpha", "2024-01-01")]);
        assert_eq!(slugs(&store.list(None).unwrap()), ["alpha", "zeta"]);
    }

    #[test]
    fn test_other_extensions_ignored() {
        let (dir, store) = store_with(&[("a", "2024-01-01")]);
        fs::write(dir.path().join("notes.txt"), "not a post").unwrap();
        fs::create_dir(dir.path().join("drafts.mdx")).unwrap();
        assert_eq!(slugs(&store.list(None).unwrap()), ["a"]);
    }

    #[test]
    fn test_missing_dir_has_no_posts() {
        let store = PostStore::new("/definitely/not/here", "mdx");
        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_get_post() {
        let (_dir, store) = store_with(&[("hello", "2024-06-01")]);
        let post = store.get("hello").unwrap();
        assert_eq!(post.meta.slug, "hello");
        assert_eq!(post.meta.title, "Post hello");
        assert_eq!(post.meta.description, "About hello");
        assert_eq!(post.body, "Body of hello\n");
    }

    #[test]
    fn test_get_is_idempotent() {
        let (_dir, store) = store_with(&[("hello", "2024-06-01")]);
        assert_eq!(store.get("hello").unwrap(), store.get("hello").unwrap());
    }

    #[test]
    fn test_missing_post_is_not_found() {
        let (_dir, store) = store_with(&[("hello", "2024-06-01")]);
        match store.get("missing-post") {
            Err(PostError::NotFound(slug)) => assert_eq!(slug, "missing-post"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_traversal_is_not_found() {
        let (dir, _) = store_with(&[]);
        let posts = dir.path().join("posts");
        fs::create_dir(&posts).unwrap();
        write_post(dir.path(), "secret", "2024-01-01");

        let store = PostStore::new(&posts, "mdx");
        for slug in ["../secret", "", ".hidden", "a/b", "a\\b"] {
            assert!(matches!(store.get(slug), Err(PostError::NotFound(_))), "{slug}");
        }
    }

    #[test]
    fn test_snake_case_date_key() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("t.mdx"),
            "+++\ntitle = \"Toml\"\npublished_at = 2024-02-02\n+++\nBody",
        )
        .unwrap();
        let store = PostStore::new(dir.path(), "mdx");
        let post = store.get("t").unwrap();
        assert_eq!(post.meta.title, "Toml");
        assert_eq!(post.meta.description, "");
    }

    #[test]
    fn test_bad_date_is_reported() {
        let (dir, store) = store_with(&[]);
        write_post(dir.path(), "bad", "someday");
        assert!(matches!(store.get("bad"), Err(PostError::Date(..))));
        assert!(store.list(None).is_err());
    }

    #[test]
    fn test_missing_title_is_metadata_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x.mdx"), "---\npublishedAt: 2024-01-01\n---\n").unwrap();
        let store = PostStore::new(dir.path(), "mdx");
        assert!(matches!(store.get("x"), Err(PostError::Metadata(..))));
    }
}
