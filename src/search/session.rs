//! Keystroke-driven search with last-write-wins publication.
//!
//! Every input runs its own query with no debounce. Responses can finish out
//! of order, so each input takes a generation number and a response is only
//! published when nothing newer has been published already:
//!
//! ```text
//! input "ru"    gen 1 ───────────────────────▶ dropped (1 < 2)
//! input "rust"  gen 2 ─────────▶ published
//! ```

use super::{AssetSource, Search, SearchError, SearchResult};
use crate::log;
use arc_swap::ArcSwap;
use futures_util::future::join_all;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// What the search box shows.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Nothing typed yet.
    Idle,
    /// Queries are disabled in this mode.
    Unavailable,
    /// Results in query order; empty when nothing matched or the query failed.
    Results(Vec<SearchResult>),
}

/// The visible view and the input it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub generation: u64,
    pub query: String,
    pub view: View,
}

pub struct SearchSession<S> {
    search: Arc<Search<S>>,
    issued: AtomicU64,
    published: ArcSwap<Published>,
}

impl<S: AssetSource> SearchSession<S> {
    pub fn new(search: Arc<Search<S>>) -> Self {
        Self {
            search,
            issued: AtomicU64::new(0),
            published: ArcSwap::from_pointee(Published {
                generation: 0,
                query: String::new(),
                view: View::Idle,
            }),
        }
    }

    #[cfg(test)]
    fn search(&self) -> &Arc<Search<S>> {
        &self.search
    }

    /// Currently visible view.
    pub fn view(&self) -> Arc<Published> {
        self.published.load_full()
    }

    /// Run `text` and publish its view.
    ///
    /// Returns `false` when a newer input had already published, in which
    /// case this response is discarded.
    pub async fn input(&self, text: &str) -> bool {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let view = self.resolve(text).await;
        self.publish(generation, text, view)
    }

    async fn resolve(&self, text: &str) -> View {
        let set = match self.search.query(text).await {
            Ok(Some(set)) => set,
            Ok(None) if text.trim().is_empty() => return View::Idle,
            Ok(None) => return View::Results(Vec::new()),
            Err(SearchError::Unavailable) => return View::Unavailable,
            Err(err) => {
                log!("search"; "query `{text}` failed: {err}");
                return View::Results(Vec::new());
            }
        };

        let data = join_all(set.results.iter().map(|hit| hit.data())).await;
        let results = data
            .into_iter()
            .filter_map(|result| match result {
                Ok(result) => Some(result),
                Err(err) => {
                    log!("search"; "dropping result: {err}");
                    None
                }
            })
            .collect();
        View::Results(results)
    }

    fn publish(&self, generation: u64, text: &str, view: View) -> bool {
        let next = Arc::new(Published {
            generation,
            query: text.to_owned(),
            view,
        });

        let mut accepted = false;
        self.published.rcu(|current| {
            accepted = current.generation < generation;
            if accepted { Arc::clone(&next) } else { Arc::clone(current) }
        });
        accepted
    }
}
