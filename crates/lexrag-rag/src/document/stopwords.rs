use std::collections::HashSet;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "at", "but", "for", "in", "is", "it", "of", "on", "or", "that", "the",
    "this", "to", "was", "with",
];

/// Small English stop-word list, all lowercase.
#[must_use]
pub fn default_stop_words() -> HashSet<String> {
    ENGLISH_STOP_WORDS.iter().map(|&w| w.to_owned()).collect()
}

/// Drop every whitespace token whose lowercase form is in `stop_words` and
/// rejoin the survivors with single spaces.
///
/// `stop_words` is expected to hold lowercase entries.
#[must_use]
pub fn remove_stop_words<S: AsRef<str>>(chunks: &[S], stop_words: &HashSet<String>) -> Vec<String> {
    chunks
        .iter()
        .map(|chunk| {
            chunk
                .as_ref()
                .split_whitespace()
                .filter(|token| !stop_words.contains(&token.to_lowercase()))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
