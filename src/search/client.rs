//! Query client over a serialized index.
//!
//! The entry manifest is loaded once, on first use; shards are fetched on
//! demand and cached; fragments are only fetched when a hit is displayed.
//!
//! # Ranking
//!
//! BM25 over the query terms. Every term must match; the last term also
//! matches as a prefix so results follow the user while typing:
//!
//! ```text
//! "async ru"  →  async  AND  (ru | rust | runtime | …)
//! ```

use super::{
    Mode, SearchError,
    excerpt::excerpt,
    index::{ENTRY_FILE, Entry, Fragment, INDEX_VERSION, Posting, Shard, fragment_path, shard_of, shard_path, tokenize},
};
use crate::config::defaults;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::BTreeSet,
    fmt, io,
    ops::Bound,
    path::PathBuf,
    sync::Arc,
};
use tokio::sync::OnceCell;

/// BM25 term-frequency saturation.
const K1: f64 = 1.2;
/// BM25 length normalization.
const B: f64 = 0.75;

// ============================================================================
// Asset sources
// ============================================================================

/// Where index files come from.
pub trait AssetSource: Send + Sync {
    /// Bytes of the file at `path`, relative to the index root.
    fn fetch(&self, path: &str) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

/// Index files in a local directory, e.g. `public/_search`.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl AssetSource for DirSource {
    async fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.dir.join(path)).await
    }
}

async fn fetch_json<S, T>(source: &S, path: &str) -> Result<T, SearchError>
where
    S: AssetSource,
    T: DeserializeOwned,
{
    let bytes = source
        .fetch(path)
        .await
        .map_err(|err| SearchError::Fetch(path.to_owned(), err))?;
    serde_json::from_slice(&bytes).map_err(|err| SearchError::Decode(path.to_owned(), err))
}

// ============================================================================
// Results
// ============================================================================

/// A displayable result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub url: String,
    /// HTML fragment with matches wrapped in `<mark>`.
    pub excerpt: String,
    pub title: String,
}

/// A ranked match whose display data is still on the server.
pub struct Hit<S> {
    source: Arc<S>,
    terms: Arc<BTreeSet<String>>,
    excerpt_words: usize,
    pub page: u32,
    pub id: String,
    pub score: f64,
}

impl<S: AssetSource> Hit<S> {
    /// Fetch the fragment and build the excerpt.
    pub async fn data(&self) -> Result<SearchResult, SearchError> {
        let fragment: Fragment = fetch_json(&*self.source, &fragment_path(&self.id)).await?;
        Ok(SearchResult {
            excerpt: excerpt(&fragment.content, &self.terms, self.excerpt_words),
            url: fragment.url,
            title: fragment.title,
        })
    }
}

impl<S> fmt::Debug for Hit<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hit")
            .field("page", &self.page)
            .field("id", &self.id)
            .field("score", &self.score)
            .finish()
    }
}

/// Hits in rank order.
#[derive(Debug)]
pub struct ResultSet<S> {
    pub results: Vec<Hit<S>>,
}

// ============================================================================
// Client
// ============================================================================

/// Query handle over one index.
///
/// Cheap to share behind an `Arc`; the manifest is written exactly once and
/// read by every query after that.
pub struct Search<S> {
    source: Arc<S>,
    mode: Mode,
    limit: Option<usize>,
    excerpt_words: usize,
    entry: OnceCell<Entry>,
    shards: Mutex<FxHashMap<String, Arc<Shard>>>,
}

impl<S: AssetSource> Search<S> {
    pub fn new(source: S, mode: Mode) -> Self {
        Self {
            source: Arc::new(source),
            mode,
            limit: None,
            excerpt_words: defaults::search::excerpt_words(),
            entry: OnceCell::new(),
            shards: Mutex::new(FxHashMap::default()),
        }
    }

    /// Cap the number of hits per query.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_excerpt_words(mut self, words: usize) -> Self {
        self.excerpt_words = words;
        self
    }

    /// Load the manifest; later calls return the loaded one.
    ///
    /// A failed load is not cached, the next call retries.
    pub async fn ready(&self) -> Result<&Entry, SearchError> {
        self.entry
            .get_or_try_init(|| async {
                let entry: Entry = fetch_json(&*self.source, ENTRY_FILE).await?;
                if entry.version != INDEX_VERSION {
                    return Err(SearchError::Version {
                        found: entry.version,
                        expected: INDEX_VERSION,
                    });
                }
                Ok(entry)
            })
            .await
    }

    /// Ranked hits for `text`.
    ///
    /// `Ok(None)` for a blank query or when nothing matches; outside
    /// production mode every query is [`SearchError::Unavailable`].
    pub async fn query(&self, text: &str) -> Result<Option<ResultSet<S>>, SearchError> {
        if !self.mode.is_production() {
            return Err(SearchError::Unavailable);
        }

        let terms: Vec<String> = tokenize(text).collect();
        if terms.is_empty() {
            return Ok(None);
        }

        let entry = self.ready().await?;
        let mut matched = BTreeSet::new();
        let mut scores: Option<FxHashMap<u32, f64>> = None;

        for (i, term) in terms.iter().enumerate() {
            let is_prefix = i + 1 == terms.len();
            let shard = self.shard(entry, &shard_of(term)).await?;

            let mut term_scores = FxHashMap::default();
            if let Some(shard) = &shard {
                for (word, postings) in candidates(shard, term, is_prefix) {
                    matched.insert(word.clone());
                    score_postings(entry, postings, &mut term_scores)?;
                }
            }

            // Every term must match
            let combined = match scores.take() {
                None => term_scores,
                Some(previous) => previous
                    .into_iter()
                    .filter_map(|(page, score)| term_scores.get(&page).map(|extra| (page, score + extra)))
                    .collect(),
            };
            if combined.is_empty() {
                return Ok(None);
            }
            scores = Some(combined);
        }

        let mut ranked: Vec<(u32, f64)> = scores.unwrap_or_default().into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        if let Some(limit) = self.limit {
            ranked.truncate(limit);
        }

        let terms = Arc::new(matched);
        let results = ranked
            .into_iter()
            .map(|(page, score)| {
                let id = entry
                    .pages
                    .get(page as usize)
                    .map(|page| page.id.clone())
                    .ok_or(SearchError::UnknownPage(page))?;
                Ok(Hit {
                    source: Arc::clone(&self.source),
                    terms: Arc::clone(&terms),
                    excerpt_words: self.excerpt_words,
                    page,
                    id,
                    score,
                })
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        Ok((!results.is_empty()).then_some(ResultSet { results }))
    }

    /// Shard `name`, fetched once and cached; `None` if the index has none.
    async fn shard(&self, entry: &Entry, name: &str) -> Result<Option<Arc<Shard>>, SearchError> {
        if !entry.shards.iter().any(|shard| shard == name) {
            return Ok(None);
        }

        let cached = self.shards.lock().get(name).cloned();
        if let Some(shard) = cached {
            return Ok(Some(shard));
        }

        let shard: Arc<Shard> = Arc::new(fetch_json(&*self.source, &shard_path(name)).await?);
        let shard = Arc::clone(self.shards.lock().entry(name.to_owned()).or_insert(shard));
        Ok(Some(shard))
    }

    #[cfg(test)]
    fn cached_shards(&self) -> usize {
        self.shards.lock().len()
    }

    /// Whether the manifest has been loaded.
    #[cfg(test)]
    fn is_ready(&self) -> bool {
        self.entry.initialized()
    }
}

/// Terms of `shard` matching `term`, exactly or as a prefix.
fn candidates<'a>(
    shard: &'a Shard,
    term: &str,
    is_prefix: bool,
) -> Vec<(&'a String, &'a Vec<Posting>)> {
    if is_prefix {
        shard
            .terms
            .range::<str, _>((Bound::Included(term), Bound::Unbounded))
            .take_while(|(word, _)| word.starts_with(term))
            .collect()
    } else {
        shard.terms.get_key_value(term).into_iter().collect()
    }
}

/// Add the BM25 contribution of one term to `scores`.
///
/// Prefix expansions of the same query term do not add up; a page keeps its
/// best-scoring expansion.
fn score_postings(
    entry: &Entry,
    postings: &[Posting],
    scores: &mut FxHashMap<u32, f64>,
) -> Result<(), SearchError> {
    let pages = entry.pages.len() as f64;
    let frequency = postings.len() as f64;
    let idf = (1.0 + (pages - frequency + 0.5) / (frequency + 0.5)).ln();
    let average = if entry.average_words > 0.0 { entry.average_words } else { 1.0 };

    for posting in postings {
        let length = entry
            .pages
            .get(posting.page as usize)
            .ok_or(SearchError::UnknownPage(posting.page))?
            .words as f64;
        let tf = posting.positions.len() as f64;
        let score = idf * tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * length / average));

        let best = scores.entry(posting.page).or_insert(0.0);
        *best = best.max(score);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::AssetSource;
    use crate::search::Artifact;
    use rustc_hash::FxHashMap;
    use std::{
        io,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    /// Serves an [`Artifact`] from memory, optionally delaying some files.
    #[derive(Default)]
    pub struct MemorySource {
        files: FxHashMap<String, Vec<u8>>,
        delays: FxHashMap<String, Duration>,
        fetches: AtomicUsize,
    }

    impl MemorySource {
        pub fn new(artifact: Artifact) -> Self {
            Self {
                files: artifact.files.into_iter().collect(),
                ..Self::default()
            }
        }

        pub fn delay(mut self, path: &str, delay: Duration) -> Self {
            self.delays.insert(path.to_owned(), delay);
            self
        }

        pub fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl AssetSource for MemorySource {
        async fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(path) {
                tokio::time::sleep(*delay).await;
            }
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_owned()))
        }
    }
}
