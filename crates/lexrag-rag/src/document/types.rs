#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Canonical path of the file the text came from.
    pub source: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Position of the chunk within its source document.
    pub chunk_index: usize,
}
