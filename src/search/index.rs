//! Index accumulation and the on-disk format.
//!
//! # Layout
//!
//! ```text
//! _search/
//! ├── entry.json          version, page ids + lengths, shard list
//! ├── fragment/<id>.json  url, title, plain text of one page
//! └── index/<shard>.json  term → postings, one file per leading char
//! ```
//!
//! Everything is keyed through `BTreeMap`s and pages are numbered in insertion
//! order, so the same documents always produce byte-identical files.

use super::{PageDocument, SearchError, document};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Bumped whenever the layout below changes.
pub const INDEX_VERSION: u32 = 1;

pub const ENTRY_FILE: &str = "entry.json";
pub const FRAGMENT_DIR: &str = "fragment";
pub const SHARD_DIR: &str = "index";

/// Shard for terms that do not start with `0-9a-z`.
const OTHER_SHARD: char = '_';
/// Hex chars of the url hash kept as fragment id.
const FRAGMENT_ID_LEN: usize = 16;

// ============================================================================
// Format
// ============================================================================

/// `entry.json`: loaded once by the query client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub version: u32,
    pub pages: Vec<PageEntry>,
    pub shards: Vec<String>,
    pub average_words: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Fragment id.
    pub id: String,
    /// Token count, used for length normalization.
    pub words: u32,
}

/// `fragment/<id>.json`: everything needed to display one result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub url: String,
    pub title: String,
    pub content: String,
    pub words: u32,
}

/// `index/<shard>.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    pub terms: BTreeMap<String, Vec<Posting>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Page number, an index into [`Entry::pages`].
    pub page: u32,
    /// Token positions of the term within the page.
    pub positions: Vec<u32>,
}

pub fn fragment_path(id: &str) -> String {
    format!("{FRAGMENT_DIR}/{id}.json")
}

pub fn shard_path(shard: &str) -> String {
    format!("{SHARD_DIR}/{shard}.json")
}

/// Stable fragment id derived from the page URL.
pub fn fragment_id(url: &str) -> String {
    let hash = blake3::hash(url.as_bytes());
    let mut id = hex::encode(hash.as_bytes());
    id.truncate(FRAGMENT_ID_LEN);
    id
}

/// Shard holding `term`.
pub fn shard_of(term: &str) -> String {
    match term.chars().next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => c.to_string(),
        _ => OTHER_SHARD.to_string(),
    }
}

/// Lowercased alphanumeric runs of `text`.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

// ============================================================================
// Accumulator
// ============================================================================

/// A serialized index: relative file paths and their contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifact {
    pub files: Vec<(String, Vec<u8>)>,
}

impl Artifact {
    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[cfg(test)]
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(file, _)| file == path)
            .map(|(_, bytes)| bytes.as_slice())
    }
}

/// Accepts page documents one at a time, then produces the artifact.
pub trait Indexer {
    fn add(&mut self, doc: PageDocument) -> Result<(), SearchError>;

    fn finish(self) -> Result<Artifact, SearchError>;

    /// Feed every document, then finish.
    fn build<I>(mut self, docs: I) -> Result<Artifact, SearchError>
    where
        Self: Sized,
        I: IntoIterator<Item = PageDocument>,
    {
        for doc in docs {
            self.add(doc)?;
        }
        self.finish()
    }
}

/// Default [`Indexer`] writing the JSON layout described above.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    urls: BTreeSet<String>,
    pages: Vec<(PageEntry, Fragment)>,
    terms: BTreeMap<String, Vec<Posting>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indexer for IndexBuilder {
    fn add(&mut self, doc: PageDocument) -> Result<(), SearchError> {
        if !self.urls.insert(doc.url.clone()) {
            return Err(SearchError::DuplicateUrl(doc.url));
        }

        let extracted = document::extract(&doc.html);
        let title = if extracted.title.is_empty() {
            doc.url.clone()
        } else {
            extracted.title
        };

        let page = self.pages.len() as u32;
        let mut positions: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let mut words = 0u32;
        for (position, token) in tokenize(&extracted.text).enumerate() {
            positions.entry(token).or_default().push(position as u32);
            words += 1;
        }
        for (term, positions) in positions {
            self.terms.entry(term).or_default().push(Posting { page, positions });
        }

        let id = fragment_id(&doc.url);
        self.pages.push((
            PageEntry { id, words },
            Fragment {
                url: doc.url,
                title,
                content: extracted.text,
                words,
            },
        ));
        Ok(())
    }

    fn finish(self) -> Result<Artifact, SearchError> {
        let mut shards: BTreeMap<String, Shard> = BTreeMap::new();
        for (term, postings) in self.terms {
            shards
                .entry(shard_of(&term))
                .or_default()
                .terms
                .insert(term, postings);
        }

        let total_words: u64 = self.pages.iter().map(|(page, _)| u64::from(page.words)).sum();
        let average_words = if self.pages.is_empty() {
            0.0
        } else {
            total_words as f64 / self.pages.len() as f64
        };

        let entry = Entry {
            version: INDEX_VERSION,
            pages: self.pages.iter().map(|(page, _)| page.clone()).collect(),
            shards: shards.keys().cloned().collect(),
            average_words,
        };

        let mut files = Vec::with_capacity(1 + self.pages.len() + shards.len());
        files.push((ENTRY_FILE.to_owned(), encode(ENTRY_FILE, &entry)?));
        for (page, fragment) in &self.pages {
            let path = fragment_path(&page.id);
            let bytes = encode(&path, fragment)?;
            files.push((path, bytes));
        }
        for (name, shard) in &shards {
            let path = shard_path(name);
            let bytes = encode(&path, shard)?;
            files.push((path, bytes));
        }

        Ok(Artifact { files })
    }
}

fn encode<T: Serialize>(path: &str, value: &T) -> Result<Vec<u8>, SearchError> {
    serde_json::to_vec(value).map_err(|err| SearchError::Encode(path.to_owned(), err))
}
