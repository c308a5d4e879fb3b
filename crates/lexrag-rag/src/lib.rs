//! Lexical retrieval-augmented generation over a directory of documents.
//!
//! The flow is strictly one-way: [`document::Extractor`] turns a directory into
//! [`document::Document`]s, [`document::TextSplitter`] cuts them into sentence-aligned
//! [`document::Chunk`]s, [`retriever::Retriever`] ranks the chunks against a query and
//! [`pipeline::RagPipeline`] hands the best ones to an LLM provider.

pub mod document;
pub mod error;
pub mod pipeline;
pub mod retriever;

pub use error::RagError;
pub use pipeline::{PipelineConfig, RagAnswer, RagPipeline};
pub use retriever::{RetrievalConfig, Retriever, ScoredChunk};
