//! Result excerpts with highlighted matches.

use super::index::tokenize;
use quick_xml::escape::escape;
use std::collections::BTreeSet;

/// `words` words of `content` around the densest cluster of `terms`.
///
/// The output is an HTML fragment: text is escaped and every matching word is
/// wrapped in `<mark>`. Without any match the excerpt starts at the top.
pub fn excerpt(content: &str, terms: &BTreeSet<String>, words: usize) -> String {
    let all: Vec<&str> = content.split_whitespace().collect();
    if all.is_empty() || words == 0 {
        return String::new();
    }

    let hits: Vec<bool> = all
        .iter()
        .map(|word| tokenize(word).any(|token| terms.contains(&token)))
        .collect();

    let width = words.min(all.len());
    let start = densest_window(&hits, width);

    all[start..start + width]
        .iter()
        .zip(&hits[start..start + width])
        .map(|(word, &hit)| {
            let word = escape(*word);
            if hit { format!("<mark>{word}</mark>") } else { word.into_owned() }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Start of the first `width`-wide window with the most hits.
fn densest_window(hits: &[bool], width: usize) -> usize {
    let mut count = hits[..width].iter().filter(|&&hit| hit).count();
    let (mut best, mut best_count) = (0, count);

    for start in 1..=hits.len() - width {
        count -= usize::from(hits[start - 1]);
        count += usize::from(hits[start + width - 1]);
        if count > best_count {
            best = start;
            best_count = count;
        }
    }

    // Lead in with a little context when the cluster is not at the very top
    if best_count > 0 && best > 0 {
        let first_hit = hits[best..].iter().position(|&hit| hit).unwrap_or(0);
        let lead = (width / 4).min(best + first_hit);
        return (best + first_hit - lead).min(hits.len() - width);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_highlights_matches() {
        let out = excerpt("Learning Rust, one crate at a time", &terms(&["rust"]), 10);
        assert_eq!(out, "Learning <mark>Rust,</mark> one crate at a time");
    }

    #[test]
    fn test_escapes_html() {
        let out = excerpt("use <Vec> & friends", &terms(&["vec"]), 10);
        assert_eq!(out, "use <mark>&lt;Vec&gt;</mark> &amp; friends");
    }

    #[test]
    fn test_window_moves_to_matches() {
        let content = (0..100)
            .map(|i| if i == 60 { "needle".to_string() } else { format!("w{i}") })
            .collect::<Vec<_>>()
            .join(" ");
        let out = excerpt(&content, &terms(&["needle"]), 8);

        assert_eq!(out.split(' ').count(), 8);
        assert!(out.contains("<mark>needle</mark>"));
        assert!(!out.starts_with("w0 "));
    }

    #[test]
    fn test_prefers_densest_cluster() {
        let content = "alpha x x x x x x x x x beta gamma beta x";
        let out = excerpt(content, &terms(&["beta", "gamma"]), 4);
        assert_eq!(out.matches("<mark>").count(), 3);
    }

    #[test]
    fn test_no_match_starts_at_top() {
        let out = excerpt("one two three four", &terms(&["zzz"]), 2);
        assert_eq!(out, "one two");
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(excerpt("", &terms(&["a"]), 5), "");
        assert_eq!(excerpt("   ", &terms(&["a"]), 5), "");
    }
}
