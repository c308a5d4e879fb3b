use super::types::{Chunk, Document};
use crate::error::RagError;

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 500;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];
const SENTENCE_SEPARATOR: &str = ". ";

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Upper bound on a chunk's length in characters, separators included.
    pub max_chunk_size: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

/// Packs whole sentences into chunks of bounded size.
///
/// A sentence is never split: one that is longer than the bound on its own
/// becomes a single oversized chunk.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `max_chunk_size` is zero.
    pub fn new(config: SplitterConfig) -> Result<Self, RagError> {
        if config.max_chunk_size == 0 {
            return Err(RagError::Config(
                "max_chunk_size must be a positive integer".into(),
            ));
        }
        Ok(Self { config })
    }

    #[must_use]
    pub fn max_chunk_size(&self) -> usize {
        self.config.max_chunk_size
    }

    /// Chunk every text independently and flatten the result, preserving order.
    #[must_use]
    pub fn chunk_text<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts
            .iter()
            .flat_map(|t| merge_sentences(&split_sentences(t.as_ref()), self.config.max_chunk_size))
            .collect()
    }

    /// Chunk one document, tagging each chunk with the document's metadata.
    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let sentences = split_sentences(&document.content);
        merge_sentences(&sentences, self.config.max_chunk_size)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk {
                content,
                metadata: document.metadata.clone(),
                chunk_index: i,
            })
            .collect()
    }
}

/// Split on `.`, `!` and `?`, trimming each fragment and dropping empty ones.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Sum of whitespace-delimited tokens across `chunks`.
#[must_use]
pub fn token_count<S: AsRef<str>>(chunks: &[S]) -> usize {
    chunks
        .iter()
        .map(|c| c.as_ref().split_whitespace().count())
        .sum()
}

fn merge_sentences(sentences: &[&str], max_chunk_size: usize) -> Vec<String> {
    let separator_len = SENTENCE_SEPARATOR.chars().count();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences {
        let len = sentence.chars().count() + separator_len;
        if !current.is_empty() && current_len + len > max_chunk_size {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(sentence);
        current.push_str(SENTENCE_SEPARATOR);
        current_len += len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
