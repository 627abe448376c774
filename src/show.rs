//! Terminal output for the read-only commands: `posts`, `post` and `search`.

use crate::{
    config::SiteConfig,
    log,
    posts::{Post, PostMeta, PostStore},
    search::{
        DirSource, Search, SearchSession, UNAVAILABLE_MESSAGE, View, client::SearchResult,
        index::ENTRY_FILE,
    },
    utils::date::format_date,
};
use anyhow::{Context, Result};
use colored::Colorize;
use quick_xml::escape::unescape;
use regex::Regex;
use std::sync::{Arc, LazyLock};

static MARK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<mark>(.*?)</mark>").unwrap());

fn store(config: &SiteConfig) -> PostStore {
    PostStore::new(&config.content.dir, config.content.extension.as_str())
}

/// `folio posts`: newest first, optionally only the latest `limit`.
pub fn list_posts(config: &SiteConfig, limit: Option<usize>) -> Result<()> {
    let posts = store(config).list(limit)?;
    if posts.is_empty() {
        log!("posts"; "no posts in {}", config.content.dir.display());
        return Ok(());
    }
    for post in &posts {
        println!("{}", post_line(post));
    }
    Ok(())
}

fn post_line(post: &PostMeta) -> String {
    format!("{:>12}  {}  {}", format_date(&post.published_at), post.slug.bold(), post.title)
}

/// `folio post <slug>`.
pub fn show_post(config: &SiteConfig, slug: &str) -> Result<()> {
    let post = store(config).get(slug)?;
    println!("{}", render_post(config, &post));
    Ok(())
}

fn render_post(config: &SiteConfig, post: &Post) -> String {
    let meta = &post.meta;
    let mut out = format!("{}\n", meta.title.bold());
    if !meta.description.is_empty() {
        out.push_str(&format!("{}\n", meta.description));
    }
    out.push_str(&format!(
        "{}  {}  {} words",
        format_date(&meta.published_at),
        config.content.post_url(&meta.slug),
        post.body.split_whitespace().count()
    ));
    out
}

/// `folio search <query>`: one session input against the built index.
pub fn search(config: &SiteConfig, query: &str) -> Result<()> {
    let dir = config.search_dir();
    if config.search.mode.is_production() && !dir.join(ENTRY_FILE).exists() {
        log!("warn"; "no search index at {}, run `folio build` first", dir.display());
    }

    let search = Search::new(DirSource::new(dir), config.search.mode)
        .with_limit(config.search.limit)
        .with_excerpt_words(config.search.excerpt_words);
    let session = SearchSession::new(Arc::new(search));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    runtime.block_on(session.input(query));

    let published = session.view();
    match &published.view {
        View::Idle => log!("search"; "empty query"),
        View::Unavailable => log!("search"; "{UNAVAILABLE_MESSAGE}"),
        View::Results(results) if results.is_empty() => {
            log!("search"; "no results for \"{}\"", published.query);
        }
        View::Results(results) => {
            log!("search"; "{} results for \"{}\"", results.len(), published.query);
            for result in results {
                println!("{}", render_result(result));
            }
        }
    }
    Ok(())
}

fn render_result(result: &SearchResult) -> String {
    format!(
        "{}\n  {}\n  {}\n",
        result.title.bold(),
        result.url.cyan(),
        highlight(&result.excerpt)
    )
}

/// Excerpt HTML to terminal text: `<mark>` becomes color, entities decoded.
fn highlight(excerpt: &str) -> String {
    let mut out = String::with_capacity(excerpt.len());
    let mut last = 0;
    for caps in MARK.captures_iter(excerpt) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&decode(&excerpt[last..whole.start()]));
        out.push_str(&decode(inner.as_str()).yellow().bold().to_string());
        last = whole.end();
    }
    out.push_str(&decode(&excerpt[last..]));
    out
}

fn decode(text: &str) -> String {
    unescape(text).map_or_else(|_| text.to_owned(), |decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn no_color() {
        colored::control::set_override(false);
    }

    fn meta() -> PostMeta {
        PostMeta {
            slug: "hello".into(),
            title: "Hello".into(),
            description: "First post".into(),
            published_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_post_line() {
        no_color();
        assert_eq!(post_line(&meta()), " Jun 1, 2024  hello  Hello");
    }

    #[test]
    fn test_render_post() {
        no_color();
        let post = Post {
            meta: meta(),
            body: "one two three".into(),
        };
        let out = render_post(&SiteConfig::default(), &post);
        assert_eq!(out, "Hello\nFirst post\nJun 1, 2024  /blog/hello  3 words");
    }

    #[test]
    fn test_highlight() {
        no_color();
        assert_eq!(highlight("use <mark>&lt;Vec&gt;</mark> &amp; more"), "use <Vec> & more");
        assert_eq!(highlight("<mark>&amp;lt;</mark>"), "&lt;");
    }

    #[test]
    fn test_render_result() {
        no_color();
        let result = SearchResult {
            url: "/blog/hello".into(),
            excerpt: "say <mark>hello</mark>".into(),
            title: "Hello".into(),
        };
        assert_eq!(render_result(&result), "Hello\n  /blog/hello\n  say hello\n");
    }
}
