use std::path::PathBuf;

use crate::document::DocumentError;

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot read corpus directory {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract text from {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("completion cancelled")]
    Cancelled,

    #[error(transparent)]
    Completion(#[from] lexrag_llm::LlmError),
}
