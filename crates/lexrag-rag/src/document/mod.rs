pub mod error;
pub mod extractor;
pub mod loader;
pub mod splitter;
pub mod stopwords;
pub mod types;

pub use error::DocumentError;
pub use extractor::{Extractor, ExtractorConfig, FailurePolicy};
pub use loader::TextLoader;
pub use splitter::{SplitterConfig, TextSplitter, split_sentences, token_count};
pub use stopwords::{default_stop_words, remove_stop_words};
pub use types::{Chunk, Document, DocumentMetadata};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub type LoadFuture<'a> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Document, DocumentError>> + Send + 'a>>;

/// Converts one file into a [`Document`].
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &std::path::Path) -> LoadFuture<'_>;

    /// Lowercase file extensions (without the dot) this loader understands.
    fn supported_extensions(&self) -> &[&str];
}
