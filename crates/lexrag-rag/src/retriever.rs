//! Lexical chunk ranking by token-set overlap.
//!
//! The score of a chunk is `|A ∩ B| / (sqrt(|A|) * sqrt(|B|))` where `A` and `B`
//! are the distinct whitespace tokens of the query and the chunk. It behaves like
//! a cosine similarity between binary term-presence vectors, lies in `[0, 1]`, and
//! is `0.0` whenever either side has no tokens. Every call rescans all candidates.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::document::Chunk;

pub const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Maximum number of chunks returned.
    pub top_n: usize,
    /// Lowercase query and chunk tokens before comparing them.
    pub case_insensitive: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            case_insensitive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Retriever {
    config: RetrievalConfig,
}

impl Retriever {
    #[must_use]
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn top_n(&self) -> usize {
        self.config.top_n
    }

    /// Texts of the `top_n` chunks most similar to `query`, best first.
    ///
    /// Ties keep their input order.
    #[must_use]
    pub fn get_chunks<S: AsRef<str>>(&self, query: &str, chunks: &[S]) -> Vec<String> {
        self.ranked_indices(query, chunks.iter().map(|c| c.as_ref()))
            .into_iter()
            .take(self.config.top_n)
            .map(|(i, _)| chunks[i].as_ref().to_owned())
            .collect()
    }

    /// The `top_n` best chunks with their scores, provenance intact.
    #[must_use]
    pub fn retrieve(&self, query: &str, chunks: &[Chunk]) -> Vec<ScoredChunk> {
        let mut ranked = self.rank(query, chunks);
        ranked.truncate(self.config.top_n);
        ranked
    }

    /// Every chunk scored against `query`, sorted best first.
    #[must_use]
    pub fn rank(&self, query: &str, chunks: &[Chunk]) -> Vec<ScoredChunk> {
        self.ranked_indices(query, chunks.iter().map(|c| c.content.as_str()))
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: chunks[i].clone(),
                score,
            })
            .collect()
    }

    fn ranked_indices<'a>(
        &self,
        query: &str,
        texts: impl Iterator<Item = &'a str>,
    ) -> Vec<(usize, f64)> {
        let query_tokens = self.tokens(query);
        let mut scored: Vec<(usize, f64)> = texts
            .enumerate()
            .map(|(i, text)| (i, similarity(&query_tokens, &self.tokens(text))))
            .collect();
        // sort_by is stable, so equal scores keep input order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored
    }

    fn tokens<'t>(&self, text: &'t str) -> HashSet<Cow<'t, str>> {
        text.split_whitespace()
            .map(|t| {
                if self.config.case_insensitive {
                    Cow::Owned(t.to_lowercase())
                } else {
                    Cow::Borrowed(t)
                }
            })
            .collect()
    }
}

/// Set-overlap cosine score of two distinct-token sets; `0.0` if either is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    intersection as f64 / ((a.len() as f64).sqrt() * (b.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentMetadata;

    fn retriever(top_n: usize) -> Retriever {
        Retriever::new(RetrievalConfig {
            top_n,
            ..RetrievalConfig::default()
        })
    }

    fn chunk(source: &str, content: &str) -> Chunk {
        Chunk {
            content: content.to_owned(),
            metadata: DocumentMetadata {
                source: source.to_owned(),
                content_type: "text/plain".to_owned(),
            },
            chunk_index: 0,
        }
    }

    fn set<'a>(words: &[&'a str]) -> HashSet<&'a str> {
        words.iter().copied().collect()
    }

    #[test]
    fn higher_overlap_ranks_first() {
        let out = retriever(1).get_chunks("quick fox", &["the quick brown fox", "lazy dog sleeps"]);
        assert_eq!(out, vec!["the quick brown fox"]);
    }

    #[test]
    fn empty_query_returns_input_order() {
        let out = retriever(3).get_chunks("", &["anything"]);
        assert_eq!(out, vec!["anything"]);
    }

    #[test]
    fn top_n_larger_than_candidates_returns_all() {
        let out = retriever(10).get_chunks("a", &["a", "b"]);
        assert_eq!(out, vec!["a", "b"]);
    }

    #[test]
    fn top_n_zero_returns_nothing() {
        assert!(retriever(0).get_chunks("a", &["a"]).is_empty());
    }

    #[test]
    fn ties_keep_input_order() {
        let out = retriever(3).get_chunks("x", &["x one", "x two", "none", "x three"]);
        assert_eq!(out, vec!["x one", "x two", "x three"]);
    }

    #[test]
    fn duplicate_tokens_count_once() {
        let a = retriever(1).rank("fox fox fox", &[chunk("s", "fox")]);
        assert!((a[0].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn case_sensitive_by_default() {
        let scored = retriever(1).rank("Fox", &[chunk("s", "fox")]);
        assert!(scored[0].score.abs() < f64::EPSILON);
    }

    #[test]
    fn case_insensitive_option_folds_case() {
        let r = Retriever::new(RetrievalConfig {
            top_n: 1,
            case_insensitive: true,
        });
        let scored = r.rank("Fox", &[chunk("s", "the FOX")]);
        let expected = 1.0 / 2f64.sqrt();
        assert!((scored[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn retrieve_keeps_provenance() {
        let chunks = vec![chunk("a.pdf", "red apple"), chunk("b.pdf", "green apple pie")];
        let hits = retriever(1).retrieve("apple pie", &chunks);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.metadata.source, "b.pdf");
    }

    #[test]
    fn similarity_formula() {
        // |A∩B| = 2, |A| = 2, |B| = 4 -> 2 / (sqrt2 * 2)
        let score = similarity(&set(&["quick", "fox"]), &set(&["the", "quick", "brown", "fox"]));
        assert!((score - 2.0 / (2f64.sqrt() * 2.0)).abs() < 1e-12);
    }

    #[test]
    fn similarity_empty_is_zero() {
        assert!(similarity(&set(&[]), &set(&["a"])).abs() < f64::EPSILON);
        assert!(similarity(&set(&["a"]), &set(&[])).abs() < f64::EPSILON);
        assert!(similarity::<&str>(&HashSet::new(), &HashSet::new()).abs() < f64::EPSILON);
    }

    mod proptest_retriever {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_returns_more_than_top_n(
                query in "[a-d ]{0,20}",
                chunks in proptest::collection::vec("[a-d ]{0,30}", 0..20),
                top_n in 0usize..10,
            ) {
                let out = retriever(top_n).get_chunks(&query, &chunks);
                prop_assert_eq!(out.len(), top_n.min(chunks.len()));
            }

            #[test]
            fn deterministic(
                query in "[a-d ]{0,20}",
                chunks in proptest::collection::vec("[a-d ]{0,30}", 0..20),
            ) {
                let r = retriever(5);
                prop_assert_eq!(r.get_chunks(&query, &chunks), r.get_chunks(&query, &chunks));
            }

            #[test]
            fn scores_in_unit_range_and_sorted(
                query in "[a-f ]{0,20}",
                texts in proptest::collection::vec("[a-f ]{0,30}", 0..20),
            ) {
                let chunks: Vec<Chunk> = texts.iter().map(|t| chunk("p", t)).collect();
                let ranked = retriever(usize::MAX).rank(&query, &chunks);
                prop_assert_eq!(ranked.len(), chunks.len());
                for hit in &ranked {
                    prop_assert!((0.0..=1.0 + 1e-12).contains(&hit.score), "score {}", hit.score);
                }
                for pair in ranked.windows(2) {
                    prop_assert!(pair[0].score >= pair[1].score);
                }
            }
        }
    }
}
