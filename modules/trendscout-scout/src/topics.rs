//! Word-frequency topic extraction and cross-platform correlation.
//!
//! Pure functions: no I/O, no quota.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::stopwords;

/// Tokens shorter than this are never topics.
pub const MIN_TOKEN_CHARS: usize = 4;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());
static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)https?://\S+").unwrap());

pub struct TopicExtractor {
    stopwords: HashSet<String>,
}

impl TopicExtractor {
    /// Extractor using the English stopword list.
    pub fn english() -> Self {
        Self::with_stopwords(stopwords::ENGLISH.iter().copied())
    }

    pub fn with_stopwords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    /// The `top_n` most frequent topic words across `texts`.
    ///
    /// Equal counts keep first-seen order.
    pub fn extract<S: AsRef<str>>(&self, texts: &[S], top_n: usize) -> Vec<String> {
        // word -> (count, first-seen position)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut position = 0usize;

        for text in texts {
            let lowered = text.as_ref().to_lowercase();
            let without_urls = URL_RE.replace_all(&lowered, " ");
            for token in WORD_RE.find_iter(&without_urls) {
                let token = token.as_str();
                if token.chars().count() < MIN_TOKEN_CHARS || self.stopwords.contains(token) {
                    continue;
                }
                let entry = counts.entry(token.to_string()).or_insert((0, position));
                entry.0 += 1;
                position += 1;
            }
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_b.cmp(count_a).then(first_a.cmp(first_b))
        });
        ranked.into_iter().take(top_n).map(|(word, _)| word).collect()
    }
}

/// Topics present in both sets. Order carries no meaning.
pub fn intersect(a: &[String], b: &[String]) -> BTreeSet<String> {
    let b: HashSet<&String> = b.iter().collect();
    a.iter().filter(|t| b.contains(t)).cloned().collect()
}
